//! Typed collection handle for document store operations.
//!
//! A [`TypedCollection`] binds a [`Document`] type to its collection and converts
//! between the typed form and the BSON the backend stores.
//!
//! # Example
//!
//! ```ignore
//! use roster_core::query::Filter;
//!
//! let employees = store.typed_collection::<EmployeeDocument>();
//! employees.insert(vec![document]).await?;
//! let found = employees.find_one(Filter::eq("employee_id", "E001")).await?;
//! ```

use bson::{Bson, Document as BsonDocument, Uuid, de::deserialize_from_bson};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

use crate::{
    backend::{DynStoreBackend, UpdateOutcome},
    document::{Document, DocumentExt},
    error::DocumentStoreResult,
    query::{Aggregation, Expr, Query},
};

/// A type-safe collection for a specific document type.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the backend reference
/// * `D` - The document type stored in the collection
#[derive(Debug)]
pub struct TypedCollection<'a, D: Document> {
    name: &'static str,
    backend: &'a dyn DynStoreBackend,
    _marker: PhantomData<D>,
}

impl<'a, D: Document> TypedCollection<'a, D> {
    pub(crate) fn new(backend: &'a dyn DynStoreBackend) -> Self {
        Self {
            name: D::collection_name(),
            backend,
            _marker: PhantomData,
        }
    }

    /// Inserts new documents into the collection.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::DuplicateKey`](crate::error::DocumentStoreError::DuplicateKey)
    /// if a unique index is violated, or another error if serialization or the backend fails.
    pub async fn insert(&self, documents: Vec<D>) -> DocumentStoreResult<()> {
        let documents = documents
            .iter()
            .map(|doc| -> DocumentStoreResult<(Uuid, Bson)> { Ok((*doc.id(), doc.to_bson()?)) })
            .collect::<DocumentStoreResult<Vec<_>>>()?;

        self.backend.insert_documents(documents, self.name).await
    }

    /// Retrieves documents by their store-assigned IDs. Unknown IDs are omitted.
    pub async fn get(&self, ids: Vec<Uuid>) -> DocumentStoreResult<Vec<D>> {
        self.backend
            .get_documents(ids, self.name)
            .await?
            .into_iter()
            .map(D::from_bson)
            .collect()
    }

    /// Queries documents in the collection.
    pub async fn query(&self, query: Query) -> DocumentStoreResult<Vec<D>> {
        self.backend
            .query_documents(query, self.name)
            .await?
            .into_iter()
            .map(D::from_bson)
            .collect()
    }

    /// Returns the first document matching `filter`, if any.
    pub async fn find_one(&self, filter: Expr) -> DocumentStoreResult<Option<D>> {
        Ok(self
            .query(Query::builder().filter(filter).limit(1).build())
            .await?
            .into_iter()
            .next())
    }

    /// Overwrites `fields` on every document matching `filter`.
    pub async fn update_fields(&self, filter: Expr, fields: BsonDocument) -> DocumentStoreResult<UpdateOutcome> {
        self.backend.update_fields(filter, fields, self.name).await
    }

    /// Deletes every document matching `filter`, returning how many were removed.
    pub async fn delete(&self, filter: Expr) -> DocumentStoreResult<u64> {
        self.backend.delete_documents(filter, self.name).await
    }

    /// Runs an aggregation and deserializes each result row into `T`.
    pub async fn aggregate<T: DeserializeOwned>(&self, aggregation: Aggregation) -> DocumentStoreResult<Vec<T>> {
        self.backend
            .aggregate(aggregation, self.name)
            .await?
            .into_iter()
            .map(|row| -> DocumentStoreResult<T> { Ok(deserialize_from_bson(row)?) })
            .collect()
    }
}
