//! cys-core - cached local resource store for the cys creative-portfolio
//! community.
//!
//! Collections of works, events and users are read through a persistent
//! key-value cache that is seeded on first use from bundled JSON documents
//! or built-in sample data. Writes require a signed-in session and persist
//! the whole collection.
//!
//! - [`store`]: `ResourceStore`, the read-through/write-through core
//! - [`storage`]: key-value backends (files on disk, in-memory)
//! - [`seed`]: seed document sources and fallback datasets
//! - [`auth`]: sessions, login/registration, password hashing
//! - [`community`]: attendance, profile stats, gallery and event queries
//! - [`models`]: typed views over records
//! - [`config`]: configuration file and environment overrides

pub mod auth;
pub mod community;
pub mod config;
pub mod error;
pub mod models;
pub mod record;
pub mod resource;
pub mod seed;
pub mod storage;
pub mod store;
pub mod utils;

pub use auth::{Auth, Session, SessionManager};
pub use config::Config;
pub use error::{Result, StoreError};
pub use record::{Collection, DeleteConfirmation, Record};
pub use resource::ResourceType;
pub use seed::{SeedSource, Seeds};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::ResourceStore;
