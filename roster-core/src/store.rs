//! The document store: the process-wide handle to a storage backend.
//!
//! A [`DocumentStore`] owns one backend behind dynamic dispatch so the backend can
//! be chosen at runtime. It is built once at startup, shared (e.g. in an `Arc`)
//! with every request, and shut down when the process exits.
//!
//! # Example
//!
//! ```ignore
//! use roster_core::store::DocumentStore;
//! use roster_memory::InMemoryStore;
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! store.add_index("employees", "employee_id", true).await?;
//! let employees = store.typed_collection::<EmployeeDocument>();
//! ```

use crate::{
    backend::{DynStoreBackend, StoreBackend},
    collection::TypedCollection,
    document::Document,
    error::DocumentStoreResult,
};

/// Handle to a document storage backend.
#[derive(Debug)]
pub struct DocumentStore {
    backend: Box<dyn DynStoreBackend>,
}

impl DocumentStore {
    /// Wraps a concrete backend.
    pub fn new<B: StoreBackend + 'static>(backend: B) -> Self {
        Self { backend: Box::new(backend) }
    }

    /// Returns a typed collection handle for documents of type `D`.
    pub fn typed_collection<D: Document>(&self) -> TypedCollection<'_, D> {
        TypedCollection::new(self.backend.as_ref())
    }

    /// Drops a collection with its documents and indexes.
    pub async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.backend.drop_collection(name).await
    }

    /// Declares an index on `field`; a unique index makes the backend reject duplicates.
    pub async fn add_index(&self, collection: &str, field: &str, unique: bool) -> DocumentStoreResult<()> {
        self.backend.add_index(collection, field, unique).await
    }

    /// Checks that the backend is reachable.
    pub async fn ping(&self) -> DocumentStoreResult<()> {
        self.backend.ping().await
    }

    /// Releases the backend's connections.
    pub async fn shutdown(&self) -> DocumentStoreResult<()> {
        self.backend.shutdown().await
    }
}
