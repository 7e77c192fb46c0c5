//! Domain models for admin.

pub mod notice;
pub mod session;

pub use notice::{Notice, NoticeVariant};
pub use session::{AdminSession, SessionView, keys as session_keys};
