// handlers/protected/mod.rs - Protected handlers (session required)
//
// Every route here sits behind `require_session_cookie`, which only checks
// that a token is present. Each handler takes `CurrentSession`, which
// re-verifies the token against the session store.

pub mod auth;
pub mod organization;
pub mod outlines;
