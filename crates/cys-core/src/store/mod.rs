//! Cached access to resource collections.
//!
//! `ResourceStore` mediates between callers and two data sources: the
//! persistent key-value store and the seed documents. Collections are
//! read through the cache (seeding it on a miss) and every write persists
//! the whole collection back under `cys_<type>`.

pub mod manager;

pub use manager::ResourceStore;
