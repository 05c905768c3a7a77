//! Storage backend abstraction for the document store.
//!
//! This module defines the traits that abstract over storage implementations,
//! allowing the document store to run on an in-memory map or on MongoDB.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`DynStoreBackend`]: A trait for dynamic dispatch over backend implementations
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances
//!
//! # Examples
//!
//! ```ignore
//! use roster_core::backend::StoreBackend;
//! use roster_core::query::Filter;
//! use bson::{Uuid, Bson, doc};
//!
//! let backend = MyBackendImpl::new();
//!
//! backend.add_index("employees", "employee_id", true).await?;
//! backend
//!     .insert_documents(vec![(Uuid::new(), Bson::Document(doc! { "employee_id": "E001" }))], "employees")
//!     .await?;
//!
//! let outcome = backend
//!     .update_fields(Filter::eq("employee_id", "E001"), doc! { "name": "Ada" }, "employees")
//!     .await?;
//! assert_eq!(outcome.matched, 1);
//! ```

use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument, Uuid};
use std::fmt::Debug;

use crate::{
    error::DocumentStoreResult,
    query::{Aggregation, Expr, Query},
};

/// Result of a field-level update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Number of documents matched by the filter.
    pub matched: u64,
    /// Number of matched documents whose content actually changed.
    pub modified: u64,
}

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// All implementations must be thread-safe and support concurrent access from multiple
/// async tasks. Each single-document write must be atomic, and unique indexes must be
/// enforced such that concurrent writers of the same key cannot both succeed.
///
/// # Error Handling
///
/// Operations return [`DocumentStoreResult<T>`](crate::error::DocumentStoreResult).
/// Violations of a unique index are reported as
/// [`DocumentStoreError::DuplicateKey`](crate::error::DocumentStoreError::DuplicateKey);
/// everything else the backend cannot do is reported as
/// [`DocumentStoreError::Backend`](crate::error::DocumentStoreError::Backend).
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts new documents into a collection.
    ///
    /// The collection is created if it doesn't exist. Fails with `DuplicateKey` if a
    /// document would violate a unique index declared with [`StoreBackend::add_index`].
    ///
    /// # Arguments
    ///
    /// * `documents` - A vector of (UUID, BSON document) pairs to insert
    /// * `collection` - The name of the collection to insert into
    async fn insert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()>;

    /// Retrieves documents from a collection by their IDs.
    ///
    /// Documents are returned in store order. Unknown IDs are omitted from the results.
    async fn get_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Queries documents in a collection using a structured query.
    ///
    /// Applies the filter, then the sort, then skips `offset` documents and returns at
    /// most `limit`.
    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Overwrites the given fields on every document matching `filter`.
    ///
    /// Fields not present in `fields` are left untouched (`$set` semantics).
    ///
    /// # Returns
    ///
    /// How many documents matched and how many were actually changed. A document
    /// whose fields already held the new values counts as matched but not modified.
    async fn update_fields(
        &self,
        filter: Expr,
        fields: BsonDocument,
        collection: &str,
    ) -> DocumentStoreResult<UpdateOutcome>;

    /// Deletes every document matching `filter`, returning the number deleted.
    async fn delete_documents(&self, filter: Expr, collection: &str) -> DocumentStoreResult<u64>;

    /// Runs a grouped aggregation, returning one BSON document per group.
    async fn aggregate(
        &self,
        aggregation: Aggregation,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Drops a collection with all of its documents and indexes.
    ///
    /// Dropping a collection that does not exist is not an error.
    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()>;

    /// Declares an index on a field of a collection.
    ///
    /// # Arguments
    ///
    /// * `collection` - The name of the collection
    /// * `field` - The name of the field to index
    /// * `unique` - Whether the backend must reject duplicate values for the field
    async fn add_index(
        &self,
        collection: &str,
        field: &str,
        unique: bool,
    ) -> DocumentStoreResult<()>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> DocumentStoreResult<()>;

    /// Cleanly shuts down the backend, releasing connections.
    ///
    /// The default implementation is a no-op; backends holding external connections
    /// should override it.
    async fn shutdown(&self) -> DocumentStoreResult<()> {
        Ok(())
    }
}

/// Object-safe mirror of [`StoreBackend`], implemented for every backend.
///
/// Lets the backend be chosen at runtime (e.g. from configuration) and stored
/// behind a `Box<dyn DynStoreBackend>`.
#[async_trait]
pub trait DynStoreBackend: Send + Sync + Debug {
    async fn insert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()>;
    async fn get_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;
    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;
    async fn update_fields(
        &self,
        filter: Expr,
        fields: BsonDocument,
        collection: &str,
    ) -> DocumentStoreResult<UpdateOutcome>;
    async fn delete_documents(&self, filter: Expr, collection: &str) -> DocumentStoreResult<u64>;
    async fn aggregate(
        &self,
        aggregation: Aggregation,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;
    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()>;
    async fn add_index(
        &self,
        collection: &str,
        field: &str,
        unique: bool,
    ) -> DocumentStoreResult<()>;
    async fn ping(&self) -> DocumentStoreResult<()>;
    async fn shutdown(&self) -> DocumentStoreResult<()>;
}

#[async_trait]
impl<B: StoreBackend + 'static> DynStoreBackend for B {
    async fn insert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        StoreBackend::insert_documents(self, documents, collection).await
    }

    async fn get_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        StoreBackend::get_documents(self, ids, collection).await
    }

    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        StoreBackend::query_documents(self, query, collection).await
    }

    async fn update_fields(
        &self,
        filter: Expr,
        fields: BsonDocument,
        collection: &str,
    ) -> DocumentStoreResult<UpdateOutcome> {
        StoreBackend::update_fields(self, filter, fields, collection).await
    }

    async fn delete_documents(&self, filter: Expr, collection: &str) -> DocumentStoreResult<u64> {
        StoreBackend::delete_documents(self, filter, collection).await
    }

    async fn aggregate(
        &self,
        aggregation: Aggregation,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        StoreBackend::aggregate(self, aggregation, collection).await
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        StoreBackend::drop_collection(self, name).await
    }

    async fn add_index(
        &self,
        collection: &str,
        field: &str,
        unique: bool,
    ) -> DocumentStoreResult<()> {
        StoreBackend::add_index(self, collection, field, unique).await
    }

    async fn ping(&self) -> DocumentStoreResult<()> {
        StoreBackend::ping(self).await
    }

    async fn shutdown(&self) -> DocumentStoreResult<()> {
        StoreBackend::shutdown(self).await
    }
}

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
