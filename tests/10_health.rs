mod common;

use anyhow::Result;
use axum::http::StatusCode;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = common::TestApp::new();

    let res = app.get("/health", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "ok");
    assert_eq!(res.body["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_describes_service() -> Result<()> {
    let app = common::TestApp::new();

    let res = app.get("/", None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "Workspace API");
    assert!(res.body["endpoints"]["outlines"].is_string());
    Ok(())
}
