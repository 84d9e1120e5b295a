//! MailPulse Storage - Campaign, recipient and tracking event persistence
//!
//! This crate provides the repositories behind the tracking core,
//! backed by PostgreSQL or an in-process memory store.

pub mod datastore;
pub mod db;
pub mod memory;
pub mod models;
pub mod repository;

pub use datastore::Datastore;
pub use db::DatabasePool;
pub use memory::MemoryStore;
pub use models::*;
pub use repository::*;
