// handlers/public/mod.rs - Public handlers (no session required)
//
// Session acquisition plus the anonymous-safe session probe.
// Route Prefix: /api/auth
// Middleware: none

pub mod auth;
