//! Core types for the chatbot admin dashboard.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod client;
pub mod credential;
pub mod email;
pub mod id;
pub mod status;

pub use client::{ClientConfig, ClientId, ClientIdError, ClientQuota};
pub use credential::{CredentialAttempt, SecurityAnswer, normalize_answer};
pub use email::{Email, EmailError};
pub use id::*;
pub use status::*;
