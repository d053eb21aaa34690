pub mod sign_out; // POST /api/auth/sign-out

pub use sign_out::sign_out;
