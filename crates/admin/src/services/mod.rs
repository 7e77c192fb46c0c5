//! Business logic services for admin.

pub mod auth;
pub mod clients;
pub mod session;

pub use auth::AuthService;
pub use clients::ClientService;
pub use session::{SessionSlot, SessionSlotError};
