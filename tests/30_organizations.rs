mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn create_organization_makes_caller_owner_and_active() -> Result<()> {
    let app = TestApp::new();
    let ada = app.sign_up("Ada", "ada@example.com").await?;

    let org = app.create_organization(&ada, "Acme", "acme").await?;

    let res = app.get("/api/auth/get-session", Some(&ada.token)).await?;
    assert_eq!(res.body["session"]["activeOrganizationId"], org.as_str());

    let res = app.get("/api/auth/organization/list", Some(&ada.token)).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body.as_array().unwrap().len(), 1);
    assert_eq!(res.body[0]["slug"], "acme");

    let res = app
        .get("/api/auth/organization/get-full-organization", Some(&ada.token))
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["organization"]["name"], "Acme");
    assert_eq!(res.body["members"][0]["role"], "owner");
    assert_eq!(res.body["members"][0]["userId"], ada.id.as_str());
    assert_eq!(res.body["members"][0]["user"]["email"], "ada@example.com");
    Ok(())
}

#[tokio::test]
async fn create_organization_rejects_bad_slug_and_duplicates() -> Result<()> {
    let app = TestApp::new();
    let ada = app.sign_up("Ada", "ada@example.com").await?;

    let res = app
        .post(
            "/api/auth/organization/create",
            Some(&ada.token),
            json!({ "name": "Acme", "slug": "Acme Corp" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["details"][0]["field"], "slug");

    app.create_organization(&ada, "Acme", "acme").await?;
    let res = app
        .post(
            "/api/auth/organization/create",
            Some(&ada.token),
            json!({ "name": "Acme Again", "slug": "acme" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn organization_limit_is_enforced() -> Result<()> {
    let mut config = workspace_api::config::AppConfig::development();
    config.organization.limit_per_user = 1;
    let app = TestApp::with_config(config);
    let ada = app.sign_up("Ada", "ada@example.com").await?;

    app.create_organization(&ada, "One", "one").await?;
    let res = app
        .post(
            "/api/auth/organization/create",
            Some(&ada.token),
            json!({ "name": "Two", "slug": "two" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn invitation_flow() -> Result<()> {
    let app = TestApp::new();
    let ada = app.sign_up("Ada", "ada@example.com").await?;
    let bob = app.sign_up("Bob", "bob@example.com").await?;
    let eve = app.sign_up("Eve", "eve@example.com").await?;
    let org = app.create_organization(&ada, "Acme", "acme").await?;

    let res = app
        .post(
            "/api/auth/organization/invite-member",
            Some(&ada.token),
            json!({ "email": "bob@example.com", "role": "member", "organizationId": org }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "pending");
    let invitation = res.body["id"].as_str().unwrap().to_string();

    // Only one pending invitation per address
    let res = app
        .post(
            "/api/auth/organization/invite-member",
            Some(&ada.token),
            json!({ "email": "bob@example.com", "role": "member", "organizationId": org }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    // Addressed to Bob, not Eve
    let res = app
        .post(
            "/api/auth/organization/accept-invitation",
            Some(&eve.token),
            json!({ "invitationId": invitation }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .post(
            "/api/auth/organization/accept-invitation",
            Some(&bob.token),
            json!({ "invitationId": invitation }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["member"]["role"], "member");
    assert_eq!(res.body["invitation"]["status"], "accepted");

    let res = app
        .post(
            "/api/auth/organization/accept-invitation",
            Some(&bob.token),
            json!({ "invitationId": invitation }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    // Members cannot invite
    let res = app
        .post(
            "/api/auth/organization/invite-member",
            Some(&bob.token),
            json!({ "email": "eve@example.com", "role": "member", "organizationId": org }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    // Already a member
    let res = app
        .post(
            "/api/auth/organization/invite-member",
            Some(&ada.token),
            json!({ "email": "bob@example.com", "role": "member", "organizationId": org }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app
        .post(
            "/api/auth/organization/accept-invitation",
            Some(&bob.token),
            json!({ "invitationId": uuid::Uuid::new_v4() }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn only_owner_removes_members_and_never_themselves() -> Result<()> {
    let app = TestApp::new();
    let ada = app.sign_up("Ada", "ada@example.com").await?;
    let bob = app.sign_up("Bob", "bob@example.com").await?;
    let org = app.create_organization(&ada, "Acme", "acme").await?;
    let bob_member = app.add_member(&ada, &org, &bob).await?;
    let bob_member_id = bob_member["id"].as_str().unwrap().to_string();

    let res = app
        .get(
            &format!("/api/auth/organization/get-full-organization?organizationId={}", org),
            Some(&ada.token),
        )
        .await?;
    let ada_member_id = res.body["members"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["role"] == "owner")
        .and_then(|m| m["id"].as_str())
        .unwrap()
        .to_string();

    let res = app
        .post(
            "/api/auth/organization/remove-member",
            Some(&bob.token),
            json!({ "memberId": ada_member_id, "organizationId": org }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .post(
            "/api/auth/organization/remove-member",
            Some(&ada.token),
            json!({ "memberId": ada_member_id, "organizationId": org }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post(
            "/api/auth/organization/remove-member",
            Some(&ada.token),
            json!({ "memberId": bob_member_id, "organizationId": org }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["member"]["userId"], bob.id.as_str());

    let res = app
        .post(
            "/api/auth/organization/remove-member",
            Some(&ada.token),
            json!({ "memberId": bob_member_id, "organizationId": org }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    // Bob lost access
    let res = app
        .get(&format!("/api/outlines?organizationId={}", org), Some(&bob.token))
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn set_active_requires_membership() -> Result<()> {
    let app = TestApp::new();
    let ada = app.sign_up("Ada", "ada@example.com").await?;
    let bob = app.sign_up("Bob", "bob@example.com").await?;
    let org = app.create_organization(&ada, "Acme", "acme").await?;

    let res = app
        .post(
            "/api/auth/organization/set-active",
            Some(&bob.token),
            json!({ "organizationId": org }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .post(
            "/api/auth/organization/set-active",
            Some(&ada.token),
            json!({ "organizationId": null }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["session"]["activeOrganizationId"].is_null());

    let res = app
        .get("/api/auth/organization/get-full-organization", Some(&ada.token))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn oversized_invitation_ttl_fails_without_panicking() -> Result<()> {
    let mut config = workspace_api::config::AppConfig::development();
    config.organization.invitation_ttl_hours = 10_000_000_000_000;
    let app = TestApp::with_config(config);
    let ada = app.sign_up("Ada", "ada@example.com").await?;
    let org = app.create_organization(&ada, "Acme", "acme").await?;

    let res = app
        .post(
            "/api/auth/organization/invite-member",
            Some(&ada.token),
            json!({ "email": "bob@example.com", "role": "member", "organizationId": org }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}
