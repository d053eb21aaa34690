pub mod auth;
pub mod org;
pub mod outline;
pub mod server;
