//! MailPulse Common - Shared types and utilities
//!
//! This crate provides the identifiers, configuration and error types
//! shared across all MailPulse components.

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
