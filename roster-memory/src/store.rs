//! In-memory storage implementation for document stores.
//!
//! This module provides a simple in-memory backend that stores documents as BSON
//! values in HashMaps behind an async-safe read-write lock.

use std::{collections::{BTreeSet, HashMap, HashSet}, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Uuid, Bson, Document as BsonDocument};

use roster_core::{
    query::{Aggregation, Expr, Query},
    error::{DocumentStoreError, DocumentStoreResult},
    backend::{StoreBackend, StoreBackendBuilder, UpdateOutcome},
};

use crate::{
    aggregate::run_aggregation,
    evaluator::{Comparable, DocumentEvaluator, field_of, sort_documents},
};

/// One collection: its documents keyed by ID plus the fields with a unique index.
#[derive(Debug, Default)]
struct CollectionState {
    documents: HashMap<String, Bson>,
    unique_fields: BTreeSet<String>,
}

impl CollectionState {
    /// Returns the `field: value` pair of the first unique index `candidate` would
    /// violate against the stored documents, skipping those whose key is in `skip`.
    fn unique_conflict(&self, candidate: &BsonDocument, skip: &HashSet<&str>) -> Option<String> {
        self.unique_fields.iter().find_map(|field| {
            let value = candidate.get(field)?;
            let taken = self.documents.iter().any(|(key, existing)| {
                !skip.contains(key.as_str())
                    && field_of(existing, field)
                        .is_some_and(|other| Comparable::from(other) == Comparable::from(value))
            });

            taken.then(|| format!("{field}: {value}"))
        })
    }
}

type StoreMap = HashMap<String, CollectionState>;


/// Thread-safe in-memory document storage backend.
///
/// This struct implements the [`StoreBackend`] trait entirely in memory. Every write
/// takes the store-wide write lock, which makes each write (including the unique index
/// checks it performs) atomic with respect to every other operation.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data.
///
/// # Performance
///
/// Queries and unique checks scan all documents in a collection. This suits
/// development, tests and small datasets; use the MongoDB backend for anything else.
///
/// # Example
///
/// ```ignore
/// use roster_memory::InMemoryStore;
/// use roster_core::backend::StoreBackend;
/// use bson::{Uuid, Bson, doc};
///
/// let store = InMemoryStore::new();
/// store.add_index("employees", "employee_id", true).await?;
///
/// let id = Uuid::new();
/// let doc = Bson::Document(doc! { "employee_id": "E001", "name": "Ada" });
/// store.insert_documents(vec![(id, doc)], "employees").await?;
///
/// let docs = store.get_documents(vec![id], "employees").await?;
/// assert_eq!(docs.len(), 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection_name -> collection state
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder
    }
}

fn as_document<'a>(document: &'a Bson, collection: &str) -> DocumentStoreResult<&'a BsonDocument> {
    document
        .as_document()
        .ok_or_else(|| DocumentStoreError::InvalidDocument(format!(
            "documents in collection {collection} must be BSON documents"
        )))
}

/// Keys of the documents in `state` matching `filter`.
fn matching_keys(state: &CollectionState, filter: &Expr) -> DocumentStoreResult<Vec<String>> {
    let mut keys = Vec::new();

    for (key, document) in &state.documents {
        if DocumentEvaluator::matches(document, Some(filter))? {
            keys.push(key.clone());
        }
    }

    Ok(keys)
}


#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_documents(&self, documents: Vec<(Uuid, Bson)>, collection: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;
        let state = store
            .entry(collection.to_string())
            .or_default();

        // Validate the whole batch before touching the collection so a rejected
        // batch leaves no partial writes behind.
        let no_skip = HashSet::new();
        let mut batch: Vec<(String, &BsonDocument)> = Vec::with_capacity(documents.len());

        for (id, doc) in &documents {
            let key = id.to_string();
            let candidate = as_document(doc, collection)?;

            if state.documents.contains_key(&key) || batch.iter().any(|(other, _)| *other == key) {
                return Err(DocumentStoreError::DuplicateKey(format!("_id: {key}"), collection.to_string()));
            }

            if let Some(conflict) = state.unique_conflict(candidate, &no_skip) {
                return Err(DocumentStoreError::DuplicateKey(conflict, collection.to_string()));
            }

            for field in &state.unique_fields {
                let Some(value) = candidate.get(field) else { continue };
                let repeated = batch.iter().any(|(_, earlier)| {
                    earlier
                        .get(field)
                        .is_some_and(|other| Comparable::from(other) == Comparable::from(value))
                });

                if repeated {
                    return Err(DocumentStoreError::DuplicateKey(
                        format!("{field}: {value}"),
                        collection.to_string(),
                    ));
                }
            }

            batch.push((key, candidate));
        }

        let keys = batch
            .into_iter()
            .map(|(key, _)| key)
            .collect::<Vec<_>>();

        for (key, (_, doc)) in keys.into_iter().zip(documents) {
            state.documents.insert(key, doc);
        }

        Ok(())
    }

    async fn get_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let state = match store.get(collection) {
            Some(state) => state,
            None => return Ok(vec![]),
        };

        let mut documents = Vec::with_capacity(ids.len());

        for id in ids {
            let key = id.to_string();

            if let Some(doc) = state.documents.get(&key) {
                documents.push(doc.clone());
            }
        }

        Ok(documents)
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let state = match store.get(collection) {
            Some(state) => state,
            None => return Ok(vec![]),
        };

        let mut documents = DocumentEvaluator::filter_documents(
            state.documents.values(),
            query.filter.as_ref(),
        )?;

        if let Some(sort) = &query.sort {
            sort_documents(&mut documents, sort);
        }

        Ok(
            documents
                .into_iter()
                .skip(query.offset.unwrap_or(0))
                .take(query.limit.unwrap_or(usize::MAX))
                .collect()
        )
    }

    async fn update_fields(&self, filter: Expr, fields: BsonDocument, collection: &str) -> DocumentStoreResult<UpdateOutcome> {
        let mut store = self.store.write().await;
        let state = match store.get_mut(collection) {
            Some(state) => state,
            None => return Ok(UpdateOutcome::default()),
        };

        let keys = matching_keys(state, &filter)?;

        if keys.is_empty() {
            return Ok(UpdateOutcome::default());
        }

        let touches_unique = fields
            .keys()
            .any(|field| state.unique_fields.contains(field));

        if touches_unique {
            if keys.len() > 1 {
                let field = fields
                    .keys()
                    .find(|field| state.unique_fields.contains(*field))
                    .map(String::as_str)
                    .unwrap_or_default();

                return Err(DocumentStoreError::DuplicateKey(
                    format!("{field}: {}", fields.get(field).unwrap_or(&Bson::Null)),
                    collection.to_string(),
                ));
            }

            let skip = keys
                .iter()
                .map(String::as_str)
                .collect::<HashSet<_>>();

            if let Some(conflict) = state.unique_conflict(&fields, &skip) {
                return Err(DocumentStoreError::DuplicateKey(conflict, collection.to_string()));
            }
        }

        let mut outcome = UpdateOutcome { matched: keys.len() as u64, modified: 0 };

        for key in &keys {
            let Some(document) = state.documents.get_mut(key).and_then(Bson::as_document_mut) else {
                continue;
            };
            let mut changed = false;

            for (field, value) in &fields {
                if document.get(field) != Some(value) {
                    document.insert(field.clone(), value.clone());
                    changed = true;
                }
            }

            if changed {
                outcome.modified += 1;
            }
        }

        Ok(outcome)
    }

    async fn delete_documents(&self, filter: Expr, collection: &str) -> DocumentStoreResult<u64> {
        let mut store = self.store.write().await;
        let state = match store.get_mut(collection) {
            Some(state) => state,
            None => return Ok(0),
        };

        let keys = matching_keys(state, &filter)?;

        for key in &keys {
            state.documents.remove(key);
        }

        Ok(keys.len() as u64)
    }

    async fn aggregate(&self, aggregation: Aggregation, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        let store = self.store.read().await;

        match store.get(collection) {
            Some(state) => run_aggregation(state.documents.values(), &aggregation),
            None => Ok(vec![]),
        }
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.store
            .write()
            .await
            .remove(name);

        Ok(())
    }

    async fn add_index(&self, collection: &str, field: &str, unique: bool) -> DocumentStoreResult<()> {
        // Non-unique indexes only speed up lookups, which a full scan makes moot here.
        if !unique {
            return Ok(());
        }

        let mut store = self.store.write().await;
        let state = store
            .entry(collection.to_string())
            .or_default();

        let mut seen: Vec<&Bson> = Vec::new();

        for document in state.documents.values() {
            let Some(value) = field_of(document, field) else { continue };

            if seen.iter().any(|other| Comparable::from(*other) == Comparable::from(value)) {
                return Err(DocumentStoreError::DuplicateKey(
                    format!("{field}: {value}"),
                    collection.to_string(),
                ));
            }

            seen.push(value);
        }

        state.unique_fields.insert(field.to_string());

        Ok(())
    }

    async fn ping(&self) -> DocumentStoreResult<()> {
        Ok(())
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
///
/// ```ignore
/// use roster_memory::InMemoryStore;
/// use roster_core::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder().build().await?;
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds a freshly initialized, empty store. Never fails.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use roster_core::query::{Filter, SortDirection};

    const EMPLOYEES: &str = "employees";

    fn employee(employee_id: &str, department: &str, salary: f64) -> (Uuid, Bson) {
        (
            Uuid::new(),
            Bson::Document(doc! {
                "employee_id": employee_id,
                "department": department,
                "salary": salary,
            }),
        )
    }

    async fn indexed_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.add_index(EMPLOYEES, "employee_id", true).await.unwrap();
        store
    }

    fn employee_ids(documents: &[Bson]) -> Vec<&str> {
        documents
            .iter()
            .map(|doc| doc.as_document().unwrap().get_str("employee_id").unwrap())
            .collect()
    }

    #[tokio::test]
    async fn insert_then_get_by_id() {
        let store = InMemoryStore::new();
        let (id, doc) = employee("E001", "Engineering", 75000.0);

        store.insert_documents(vec![(id, doc.clone())], EMPLOYEES).await.unwrap();

        assert_eq!(store.get_documents(vec![id, Uuid::new()], EMPLOYEES).await.unwrap(), vec![doc]);
        assert!(store.get_documents(vec![id], "other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicates_without_partial_writes() {
        let store = indexed_store().await;
        store.insert_documents(vec![employee("E001", "HR", 1.0)], EMPLOYEES).await.unwrap();

        let err = store
            .insert_documents(vec![employee("E001", "Sales", 2.0)], EMPLOYEES)
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentStoreError::DuplicateKey(ref key, _) if key.contains("E001")));

        let err = store
            .insert_documents(vec![employee("E002", "HR", 1.0), employee("E002", "HR", 1.0)], EMPLOYEES)
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentStoreError::DuplicateKey(..)));

        let all = store.query_documents(Query::new(), EMPLOYEES).await.unwrap();
        assert_eq!(employee_ids(&all), vec!["E001"]);
    }

    #[tokio::test]
    async fn concurrent_inserts_of_one_key_admit_exactly_one() {
        let store = indexed_store().await;

        let attempts = (0..16).map(|n| {
            let store = store.clone();
            async move {
                store
                    .insert_documents(vec![employee("E100", "Ops", n as f64 + 1.0)], EMPLOYEES)
                    .await
            }
        });
        let results = futures::future::join_all(attempts).await;

        assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .filter_map(|result| result.as_ref().err())
                .all(|err| matches!(err, DocumentStoreError::DuplicateKey(..)))
        );
    }

    #[tokio::test]
    async fn add_index_fails_when_existing_data_collides() {
        let store = InMemoryStore::new();
        store
            .insert_documents(vec![employee("E001", "HR", 1.0), employee("E001", "HR", 2.0)], EMPLOYEES)
            .await
            .unwrap();

        let err = store.add_index(EMPLOYEES, "employee_id", true).await.unwrap_err();
        assert!(matches!(err, DocumentStoreError::DuplicateKey(..)));
    }

    #[tokio::test]
    async fn query_filters_sorts_and_paginates() {
        let store = InMemoryStore::new();
        store
            .insert_documents(
                vec![
                    employee("E003", "Engineering", 3.0),
                    employee("E001", "Engineering", 1.0),
                    employee("E002", "HR", 2.0),
                    employee("E004", "Engineering", 4.0),
                ],
                EMPLOYEES,
            )
            .await
            .unwrap();

        let query = Query::builder()
            .filter(Filter::eq("department", "Engineering"))
            .sort("salary", SortDirection::Desc)
            .offset(1)
            .limit(2)
            .build();
        let page = store.query_documents(query, EMPLOYEES).await.unwrap();

        assert_eq!(employee_ids(&page), vec!["E003", "E001"]);
    }

    #[tokio::test]
    async fn update_fields_counts_matched_and_modified() {
        let store = indexed_store().await;
        store.insert_documents(vec![employee("E001", "HR", 1.0)], EMPLOYEES).await.unwrap();

        let outcome = store
            .update_fields(Filter::eq("employee_id", "E001"), doc! { "salary": 5.0 }, EMPLOYEES)
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome { matched: 1, modified: 1 });

        let outcome = store
            .update_fields(Filter::eq("employee_id", "E001"), doc! { "salary": 5.0 }, EMPLOYEES)
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome { matched: 1, modified: 0 });

        let outcome = store
            .update_fields(Filter::eq("employee_id", "E999"), doc! { "salary": 5.0 }, EMPLOYEES)
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::default());

        let stored = store.query_documents(Query::new(), EMPLOYEES).await.unwrap();
        let stored = stored[0].as_document().unwrap();
        assert_eq!(stored.get_f64("salary").unwrap(), 5.0);
        assert_eq!(stored.get_str("department").unwrap(), "HR");
    }

    #[tokio::test]
    async fn update_fields_enforces_unique_index() {
        let store = indexed_store().await;
        store
            .insert_documents(vec![employee("E001", "HR", 1.0), employee("E002", "HR", 2.0)], EMPLOYEES)
            .await
            .unwrap();

        let err = store
            .update_fields(Filter::eq("employee_id", "E002"), doc! { "employee_id": "E001" }, EMPLOYEES)
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentStoreError::DuplicateKey(..)));

        // Re-setting a document's own key is not a conflict.
        let outcome = store
            .update_fields(Filter::eq("employee_id", "E002"), doc! { "employee_id": "E002" }, EMPLOYEES)
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome { matched: 1, modified: 0 });
    }

    #[tokio::test]
    async fn delete_documents_returns_count() {
        let store = InMemoryStore::new();
        store
            .insert_documents(vec![employee("E001", "HR", 1.0), employee("E002", "HR", 2.0)], EMPLOYEES)
            .await
            .unwrap();

        assert_eq!(store.delete_documents(Filter::eq("employee_id", "E001"), EMPLOYEES).await.unwrap(), 1);
        assert_eq!(store.delete_documents(Filter::eq("employee_id", "E001"), EMPLOYEES).await.unwrap(), 0);
        assert_eq!(store.delete_documents(Filter::eq("employee_id", "E001"), "missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn drop_collection_removes_documents_and_indexes() {
        let store = indexed_store().await;
        store.insert_documents(vec![employee("E001", "HR", 1.0)], EMPLOYEES).await.unwrap();

        store.drop_collection(EMPLOYEES).await.unwrap();
        store.drop_collection(EMPLOYEES).await.unwrap();

        assert!(store.query_documents(Query::new(), EMPLOYEES).await.unwrap().is_empty());
        store
            .insert_documents(vec![employee("E001", "HR", 1.0), employee("E001", "HR", 1.0)], EMPLOYEES)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn aggregate_groups_stored_documents() {
        let store = InMemoryStore::new();
        store
            .insert_documents(
                vec![
                    employee("E001", "Engineering", 70000.0),
                    employee("E002", "Engineering", 80000.0),
                    employee("E003", "HR", 60000.0),
                ],
                EMPLOYEES,
            )
            .await
            .unwrap();

        let aggregation = Aggregation::builder("department")
            .avg("avg_salary", "salary")
            .sort("avg_salary", SortDirection::Desc)
            .build();
        let rows = store.aggregate(aggregation, EMPLOYEES).await.unwrap();

        assert_eq!(rows, vec![
            Bson::Document(doc! { "department": "Engineering", "avg_salary": 75000.0 }),
            Bson::Document(doc! { "department": "HR", "avg_salary": 60000.0 }),
        ]);
    }
}
