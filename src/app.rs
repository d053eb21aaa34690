use axum::{
    extract::State,
    http::{HeaderName, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{protected, public};
use crate::middleware::require_session_cookie;
use crate::state::AppState;

/// Full HTTP surface with global layers applied
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Session cookie required
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/auth/sign-up/email", post(auth::sign_up_email))
        .route("/api/auth/sign-in/email", post(auth::sign_in_email))
        .route("/api/auth/get-session", get(auth::get_session))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(organization_routes())
        .merge(outline_routes())
        .route_layer(middleware::from_fn_with_state(state, require_session_cookie))
}

fn auth_routes() -> Router<AppState> {
    use protected::auth;

    Router::new().route("/api/auth/sign-out", post(auth::sign_out))
}

fn organization_routes() -> Router<AppState> {
    use protected::organization as org;

    Router::new()
        .route("/api/auth/organization/create", post(org::create))
        .route("/api/auth/organization/list", get(org::list))
        .route("/api/auth/organization/set-active", post(org::set_active))
        .route(
            "/api/auth/organization/get-full-organization",
            get(org::get_full_organization),
        )
        .route("/api/auth/organization/invite-member", post(org::invite_member))
        .route("/api/auth/organization/accept-invitation", post(org::accept_invitation))
        .route("/api/auth/organization/remove-member", post(org::remove_member))
}

fn outline_routes() -> Router<AppState> {
    use protected::outlines;

    Router::new()
        .route("/api/outlines", get(outlines::outlines_get).post(outlines::outlines_post))
        .route(
            "/api/outlines/:id",
            put(outlines::outline_put).delete(outlines::outline_delete),
        )
        .route("/api/outlines/:id/duplicate", post(outlines::outline_duplicate))
}

/// Any origin is accepted by echoing it back, since a literal `*` cannot be
/// combined with credentials.
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let methods: Vec<Method> = security
        .cors_allowed_methods
        .iter()
        .filter_map(|m| Method::from_bytes(m.as_bytes()).ok())
        .collect();
    let headers: Vec<HeaderName> = security
        .cors_allowed_headers
        .iter()
        .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(true)
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "Workspace API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Organizations, memberships and proposal outlines",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "auth": "/api/auth/sign-up/email, /api/auth/sign-in/email, /api/auth/get-session (public), /api/auth/sign-out (session)",
            "organization": "/api/auth/organization/* (session)",
            "outlines": "/api/outlines[/:id[/duplicate]] (session)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "error": "database unavailable"
                })),
            )
        }
    }
}
