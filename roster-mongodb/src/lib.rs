//! MongoDB backend implementation for roster.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait,
//! translating the roster query and aggregation AST into MongoDB filters and pipelines.
//!
//! # Features
//!
//! - **Persistent storage** - Data is persisted to MongoDB Atlas or self-hosted MongoDB
//! - **Native queries** - Filtering, sorting, pagination and `$group` aggregation run server-side
//! - **Unique indexes** - Duplicate key errors are reported as `DocumentStoreError::DuplicateKey`
//!
//! # Example
//!
//! ```ignore
//! use roster_core::backend::StoreBackendBuilder;
//! use roster_mongodb::MongoDbStore;
//!
//! let store = MongoDbStore::builder("mongodb://localhost:27017", "assessment_db")
//!     .build()
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as roster_mongodb;

mod query;
mod sanitizer;
pub mod store;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
