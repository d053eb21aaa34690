mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{outline_payload, TestApp};

#[tokio::test]
async fn acme_scenario() -> Result<()> {
    let app = TestApp::new();
    let a = app.sign_up("A", "a@example.com").await?;
    let b = app.sign_up("B", "b@example.com").await?;
    let acme = app.create_organization(&a, "Acme", "acme").await?;

    let res = app.create_outline(&a, &acme, "Intro").await?;
    assert_eq!(res.status, StatusCode::CREATED);
    let id = res.body["id"].as_str().unwrap().to_string();
    assert_eq!(res.body["organizationId"], acme.as_str());
    assert!(res.body["createdAt"].is_string());

    let res = app
        .get(&format!("/api/outlines?organizationId={}", acme), Some(&b.token))
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .request(
            Method::PUT,
            &format!("/api/outlines/{}", id),
            Some(&a.token),
            Some(json!({ "status": "COMPLETED" })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "COMPLETED");
    assert_eq!(res.body["header"], "Intro");
    assert_eq!(res.body["sectionType"], "EXECUTIVE_SUMMARY");
    assert_eq!(res.body["target"], 10);
    assert_eq!(res.body["limit"], 20);
    assert_eq!(res.body["reviewer"], "ASSIM");
    Ok(())
}

#[tokio::test]
async fn create_then_list_newest_first() -> Result<()> {
    let app = TestApp::new();
    let a = app.sign_up("A", "a@example.com").await?;
    let acme = app.create_organization(&a, "Acme", "acme").await?;

    for header in ["First", "Second", "Third"] {
        let res = app.create_outline(&a, &acme, header).await?;
        assert_eq!(res.status, StatusCode::CREATED);
    }

    let res = app
        .get(&format!("/api/outlines?organizationId={}", acme), Some(&a.token))
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    let headers: Vec<&str> = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["header"].as_str().unwrap())
        .collect();
    assert_eq!(headers, ["Third", "Second", "First"]);
    Ok(())
}

#[tokio::test]
async fn list_and_create_failure_order() -> Result<()> {
    let app = TestApp::new();
    let a = app.sign_up("A", "a@example.com").await?;
    let b = app.sign_up("B", "b@example.com").await?;
    let acme = app.create_organization(&a, "Acme", "acme").await?;

    let res = app.get("/api/outlines", Some(&a.token)).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "Organization ID is required");

    let res = app.post("/api/outlines", None, outline_payload(&acme, "Intro")).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app.post("/api/outlines", Some(&a.token), json!({ "header": "Intro" })).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    // Membership is checked before the payload
    let res = app
        .post("/api/outlines", Some(&b.token), json!({ "organizationId": acme, "target": -1 }))
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .post(
            "/api/outlines",
            Some(&a.token),
            json!({
                "organizationId": acme,
                "header": "",
                "sectionType": "APPENDIX",
                "status": "PENDING",
                "target": -1,
                "limit": 20,
                "reviewer": "ASSIM"
            }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = res.body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["header", "sectionType", "target"]);
    Ok(())
}

#[tokio::test]
async fn partial_update_leaves_other_fields() -> Result<()> {
    let app = TestApp::new();
    let a = app.sign_up("A", "a@example.com").await?;
    let acme = app.create_organization(&a, "Acme", "acme").await?;
    let created = app.create_outline(&a, &acme, "Intro").await?.body;
    let id = created["id"].as_str().unwrap();

    let res = app
        .request(
            Method::PUT,
            &format!("/api/outlines/{}", id),
            Some(&a.token),
            Some(json!({ "target": 15 })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    for field in ["header", "sectionType", "status", "limit", "reviewer", "organizationId", "createdAt"] {
        assert_eq!(res.body[field], created[field], "{} changed", field);
    }
    assert_eq!(res.body["target"], 15);

    let res = app
        .request(
            Method::PUT,
            &format!("/api/outlines/{}", id),
            Some(&a.token),
            Some(json!({ "limit": "lots" })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["details"][0]["field"], "limit");
    Ok(())
}

#[tokio::test]
async fn foreign_outlines_are_not_mutated() -> Result<()> {
    let app = TestApp::new();
    let a = app.sign_up("A", "a@example.com").await?;
    let b = app.sign_up("B", "b@example.com").await?;
    let acme = app.create_organization(&a, "Acme", "acme").await?;
    app.create_organization(&b, "Globex", "globex").await?;
    let id = app.create_outline(&a, &acme, "Intro").await?.body["id"]
        .as_str()
        .unwrap()
        .to_string();

    let uri = format!("/api/outlines/{}", id);
    let res = app
        .request(Method::PUT, &uri, Some(&b.token), Some(json!({ "header": "Hijacked" })))
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.request(Method::DELETE, &uri, Some(&b.token), None).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .request(Method::POST, &format!("{}/duplicate", uri), Some(&b.token), None)
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    // Unknown ids are 404 before any membership question
    let res = app
        .request(Method::PUT, "/api/outlines/not-an-id", Some(&b.token), Some(json!({})))
        .await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app
        .get(&format!("/api/outlines?organizationId={}", acme), Some(&a.token))
        .await?;
    assert_eq!(res.body.as_array().unwrap().len(), 1);
    assert_eq!(res.body[0]["header"], "Intro");
    Ok(())
}

#[tokio::test]
async fn delete_twice_is_not_found() -> Result<()> {
    let app = TestApp::new();
    let a = app.sign_up("A", "a@example.com").await?;
    let acme = app.create_organization(&a, "Acme", "acme").await?;
    let id = app.create_outline(&a, &acme, "Intro").await?.body["id"]
        .as_str()
        .unwrap()
        .to_string();
    let uri = format!("/api/outlines/{}", id);

    let res = app.request(Method::DELETE, &uri, Some(&a.token), None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "Outline deleted successfully");

    let res = app.request(Method::DELETE, &uri, Some(&a.token), None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn duplicate_copies_fields_with_suffix() -> Result<()> {
    let app = TestApp::new();
    let a = app.sign_up("A", "a@example.com").await?;
    let acme = app.create_organization(&a, "Acme", "acme").await?;
    let original = app.create_outline(&a, &acme, "Intro").await?.body;
    let id = original["id"].as_str().unwrap();

    let res = app
        .request(Method::POST, &format!("/api/outlines/{}/duplicate", id), Some(&a.token), None)
        .await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_ne!(res.body["id"], original["id"]);
    assert_eq!(res.body["header"], "Intro (Copy)");
    for field in ["sectionType", "status", "target", "limit", "reviewer", "organizationId"] {
        assert_eq!(res.body[field], original[field], "{} differs", field);
    }

    // Copying the copy suffixes once more, never collapses
    let copy_id = res.body["id"].as_str().unwrap().to_string();
    let res = app
        .request(
            Method::POST,
            &format!("/api/outlines/{}/duplicate", copy_id),
            Some(&a.token),
            None,
        )
        .await?;
    assert_eq!(res.body["header"], "Intro (Copy) (Copy)");
    Ok(())
}

#[tokio::test]
async fn members_share_outlines() -> Result<()> {
    let app = TestApp::new();
    let a = app.sign_up("A", "a@example.com").await?;
    let b = app.sign_up("B", "b@example.com").await?;
    let acme = app.create_organization(&a, "Acme", "acme").await?;
    app.add_member(&a, &acme, &b).await?;

    let id = app.create_outline(&a, &acme, "Intro").await?.body["id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = app
        .request(
            Method::PUT,
            &format!("/api/outlines/{}", id),
            Some(&b.token),
            Some(json!({ "reviewer": "MAMI" })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["reviewer"], "MAMI");

    let res = app
        .request(Method::DELETE, &format!("/api/outlines/{}", id), Some(&b.token), None)
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    Ok(())
}
