//! In-memory document storage backend for roster.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is meant for development,
//! tests and throwaway deployments (`--mongodb-url memory://`).
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Unique indexes** - Enforced atomically under the write lock
//! - **Full query support** - Filtering, sorting, pagination and group-by aggregation
//!
//! # Quick Start
//!
//! ```ignore
//! use roster_core::store::DocumentStore;
//! use roster_memory::InMemoryStore;
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! store.add_index("employees", "employee_id", true).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as roster_memory;

mod aggregate;
mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
