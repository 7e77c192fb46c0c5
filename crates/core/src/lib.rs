//! Chatbot Admin Core - Shared types library.
//!
//! This crate provides common types used across all chatbot admin components:
//! - `admin` - Administration server (auth gate, client configuration API)
//! - `cli` - Command-line tools for signing in and inspecting clients
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for emails, ids, security answers, roles and
//!   client configuration records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
