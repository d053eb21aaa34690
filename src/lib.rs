pub mod app;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;
pub mod validation;

pub use app::app;
pub use config::AppConfig;
pub use error::ApiError;
pub use state::AppState;

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=info";

/// Install the global tracing subscriber. Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
