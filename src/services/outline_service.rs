use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use super::access::{parse_organization_id, require_membership};
use crate::database::models::Outline;
use crate::database::Store;
use crate::error::ApiError;
use crate::validation;

/// Outline lifecycle: list, create, update, delete, duplicate.
///
/// Every operation resolves the owning organization and checks membership
/// before touching the row. For id-addressed operations the organization is
/// taken from the stored row, never from the request.
pub struct OutlineService {
    store: Arc<dyn Store>,
}

impl OutlineService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, user_id: Uuid, organization_id: Option<&str>) -> Result<Vec<Outline>, ApiError> {
        let organization_id = require_organization_id(organization_id)?;
        require_membership(self.store.as_ref(), organization_id, user_id).await?;

        let outlines = self.store.list_outlines(organization_id).await?;
        tracing::debug!("Listed {} outlines for organization {}", outlines.len(), organization_id);
        Ok(outlines)
    }

    pub async fn create(&self, user_id: Uuid, body: &Value) -> Result<Outline, ApiError> {
        let organization_id = require_organization_id(body.get("organizationId").and_then(Value::as_str))?;
        require_membership(self.store.as_ref(), organization_id, user_id).await?;

        let fields = validation::create_outline(body)?;
        let outline = self.store.insert_outline(organization_id, fields).await?;

        tracing::info!("Created outline {} in organization {}", outline.id, organization_id);
        Ok(outline)
    }

    pub async fn update(&self, user_id: Uuid, id: &str, body: &Value) -> Result<Outline, ApiError> {
        let existing = self.load_authorized(user_id, id).await?;

        let patch = validation::update_outline(body)?;
        let outline = self
            .store
            .update_outline(existing.id, patch)
            .await?
            .ok_or_else(outline_not_found)?;

        tracing::info!("Updated outline {}", outline.id);
        Ok(outline)
    }

    pub async fn delete(&self, user_id: Uuid, id: &str) -> Result<(), ApiError> {
        let existing = self.load_authorized(user_id, id).await?;

        if !self.store.delete_outline(existing.id).await? {
            return Err(outline_not_found());
        }

        tracing::info!("Deleted outline {}", existing.id);
        Ok(())
    }

    pub async fn duplicate(&self, user_id: Uuid, id: &str) -> Result<Outline, ApiError> {
        let original = self.load_authorized(user_id, id).await?;

        let copy = self
            .store
            .insert_outline(original.organization_id, original.duplicate_fields())
            .await?;

        tracing::info!("Duplicated outline {} as {}", original.id, copy.id);
        Ok(copy)
    }

    /// Resolve the row, then authorize against the organization it belongs to
    async fn load_authorized(&self, user_id: Uuid, id: &str) -> Result<Outline, ApiError> {
        let id = Uuid::parse_str(id.trim()).map_err(|_| outline_not_found())?;
        let outline = self.store.find_outline(id).await?.ok_or_else(outline_not_found)?;
        require_membership(self.store.as_ref(), outline.organization_id, user_id).await?;
        Ok(outline)
    }
}

fn require_organization_id(raw: Option<&str>) -> Result<Uuid, ApiError> {
    match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_organization_id(raw),
        _ => Err(ApiError::bad_request("Organization ID is required")),
    }
}

fn outline_not_found() -> ApiError {
    ApiError::not_found("Outline not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryStore, NewOrganization, NewUser};
    use crate::database::models::OutlineStatus;
    use axum::http::StatusCode;
    use serde_json::json;

    struct Fixture {
        service: OutlineService,
        store: Arc<MemoryStore>,
        owner: Uuid,
        outsider: Uuid,
        org: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let owner = store
            .create_user(NewUser {
                name: "A".into(),
                email: "a@example.com".into(),
                password_hash: String::new(),
            })
            .await
            .unwrap()
            .id;
        let outsider = store
            .create_user(NewUser {
                name: "B".into(),
                email: "b@example.com".into(),
                password_hash: String::new(),
            })
            .await
            .unwrap()
            .id;
        let (org, _) = store
            .create_organization(
                NewOrganization {
                    name: "Acme".into(),
                    slug: "acme".into(),
                },
                owner,
            )
            .await
            .unwrap();
        Fixture {
            service: OutlineService::new(store.clone()),
            store,
            owner,
            outsider,
            org: org.id,
        }
    }

    fn payload(org: Uuid) -> Value {
        json!({
            "organizationId": org.to_string(),
            "header": "Intro",
            "sectionType": "EXECUTIVE_SUMMARY",
            "status": "PENDING",
            "target": 10,
            "limit": 20,
            "reviewer": "ASSIM"
        })
    }

    #[tokio::test]
    async fn list_requires_organization_id_and_membership() {
        let f = fixture().await;
        let err = f.service.list(f.owner, None).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let err = f.service.list(f.owner, Some("  ")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let org = f.org.to_string();
        let err = f.service.list(f.outsider, Some(&org)).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        let err = f.service.list(f.owner, Some("not-a-uuid")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        assert!(f.service.list(f.owner, Some(&org)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn membership_is_checked_before_payload_validation() {
        let f = fixture().await;
        let body = json!({ "organizationId": f.org.to_string(), "header": "" });
        let err = f.service.create(f.outsider, &body).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let err = f.service.create(f.owner, &body).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn foreign_rows_are_never_mutated() {
        let f = fixture().await;
        let outline = f.service.create(f.owner, &payload(f.org)).await.unwrap();
        let id = outline.id.to_string();

        let body = json!({ "status": "COMPLETED" });
        let err = f.service.update(f.outsider, &id, &body).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        let err = f.service.delete(f.outsider, &id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        let err = f.service.duplicate(f.outsider, &id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let stored = f.store.find_outline(outline.id).await.unwrap().unwrap();
        assert_eq!(stored, outline);
        assert_eq!(f.store.list_outlines(f.org).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_patches_only_present_fields() {
        let f = fixture().await;
        let outline = f.service.create(f.owner, &payload(f.org)).await.unwrap();
        let updated = f
            .service
            .update(f.owner, &outline.id.to_string(), &json!({ "status": "COMPLETED" }))
            .await
            .unwrap();
        assert_eq!(updated.status, OutlineStatus::Completed);
        assert_eq!(updated.header, outline.header);
        assert_eq!(updated.target, outline.target);
        assert_eq!(updated.limit, outline.limit);
        assert_eq!(updated.reviewer, outline.reviewer);
        assert_eq!(updated.section_type, outline.section_type);
    }

    #[tokio::test]
    async fn delete_twice_reports_not_found() {
        let f = fixture().await;
        let outline = f.service.create(f.owner, &payload(f.org)).await.unwrap();
        let id = outline.id.to_string();
        f.service.delete(f.owner, &id).await.unwrap();
        let err = f.service.delete(f.owner, &id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        let err = f.service.delete(f.owner, "nonsense").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_copies_business_fields() {
        let f = fixture().await;
        let outline = f.service.create(f.owner, &payload(f.org)).await.unwrap();
        let copy = f.service.duplicate(f.owner, &outline.id.to_string()).await.unwrap();
        assert_ne!(copy.id, outline.id);
        assert_eq!(copy.header, "Intro (Copy)");
        assert_eq!(copy.organization_id, outline.organization_id);

        let mut expected = outline.fields();
        expected.header = "Intro (Copy)".to_string();
        assert_eq!(copy.fields(), expected);
    }
}
