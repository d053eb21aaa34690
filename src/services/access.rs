use uuid::Uuid;

use crate::database::models::Member;
use crate::database::Store;
use crate::error::ApiError;

/// Membership point lookup backing every outline operation.
/// Absence is always the same fixed 403.
pub async fn require_membership(
    store: &dyn Store,
    organization_id: Uuid,
    user_id: Uuid,
) -> Result<Member, ApiError> {
    match store.find_member(organization_id, user_id).await? {
        Some(member) => Ok(member),
        None => {
            tracing::warn!(
                "User {} is not a member of organization {}",
                user_id,
                organization_id
            );
            Err(ApiError::forbidden("Not a member of this organization"))
        }
    }
}

/// Membership with role `owner`, required for invitations and member removal
pub async fn require_owner(
    store: &dyn Store,
    organization_id: Uuid,
    user_id: Uuid,
    action: &str,
) -> Result<Member, ApiError> {
    let member = require_membership(store, organization_id, user_id).await?;
    if !member.is_owner() {
        tracing::warn!(
            "User {} attempted to {} in organization {} without owner role",
            user_id,
            action,
            organization_id
        );
        return Err(ApiError::forbidden(format!("Only owners can {}", action)));
    }
    Ok(member)
}

/// Caller-supplied organization id. Anything unparseable cannot have a
/// membership row, so it is reported the same way as a foreign organization.
pub fn parse_organization_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::forbidden("Not a member of this organization"))
}
