//! HTTP middleware for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request spans)
//! 3. Session layer (tower-sessions memory store)
//! 4. Auth extractors on protected handlers

pub mod auth;
pub mod session;

pub use auth::{AdminAuthRejection, OptionalAdminSession, RequireAdminAuth};
pub use session::{SESSION_COOKIE_NAME, SignOutLedger, TowerSessionSlot, create_session_layer};
