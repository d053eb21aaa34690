// handlers/public/auth/mod.rs - Session acquisition

pub mod session; // GET  /api/auth/get-session
pub mod sign_in; // POST /api/auth/sign-in/email
pub mod sign_up; // POST /api/auth/sign-up/email

pub use session::get_session;
pub use sign_in::sign_in_email;
pub use sign_up::sign_up_email;
