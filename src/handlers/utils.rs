use axum::{extract::rejection::JsonRejection, Json};
use serde_json::Value;

use crate::error::ApiError;

/// Unwrap a JSON body whose rejection was deferred so that session checks
/// always run first.
pub fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    let Json(value) = body?;
    Ok(value)
}
