// handlers/mod.rs - Two-tier handler layout
//
// Public (no session required) → Protected (session cookie gate + per-handler
// server-side re-verification through the `CurrentSession` extractor).
pub mod protected; // Tier 2: session required (/api/outlines*, /api/auth/organization/*, sign-out)
pub mod public; // Tier 1: no session required (sign-up, sign-in, get-session)
pub mod utils;
