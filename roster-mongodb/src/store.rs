use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Document, Bson, Uuid, doc};
use mongodb::{
    Client, Collection as MongoCollection, IndexModel,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{ClientOptions, FindOptions, IndexOptions},
};
use roster_core::{
    backend::{StoreBackend, StoreBackendBuilder, UpdateOutcome},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Aggregation, Expr, Query},
};

use crate::{
    sanitizer::KeySanitizer,
    query::{MongoQueryTranslator, aggregation_pipeline, sort_document},
};

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;


/// Returns true if `error` reports a unique index violation.
fn is_duplicate_key(error: &MongoError) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY_CODE,
        ErrorKind::InsertMany(insert_error) => insert_error
            .write_errors
            .as_ref()
            .is_some_and(|errors| errors.iter().any(|e| e.code == DUPLICATE_KEY_CODE)),
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

/// Maps a driver error on a write to `collection`, singling out unique index violations.
fn write_error(error: MongoError, collection: &str) -> DocumentStoreError {
    if is_duplicate_key(&error) {
        DocumentStoreError::DuplicateKey(error.to_string(), collection.to_string())
    } else {
        DocumentStoreError::Backend(error.to_string())
    }
}

fn backend_error(error: MongoError) -> DocumentStoreError {
    DocumentStoreError::Backend(error.to_string())
}

/// The server rejects a skip above `i64::MAX`; past the end of the collection it
/// makes no difference anyway.
fn skip_count(offset: usize) -> u64 {
    (offset as u64).min(i64::MAX as u64)
}


/// MongoDB-backed document store.
///
/// Each document is stored with its store-assigned [`Uuid`] as `_id`; the `_id` is
/// stripped again on read. Unique indexes are delegated to MongoDB, whose duplicate
/// key errors surface as [`DocumentStoreError::DuplicateKey`].
#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(&KeySanitizer::sanitize_key(collection_name))
    }

    fn prepare_document(&self, id: &Uuid, document: &Bson) -> DocumentStoreResult<Document> {
        let mut prepared = KeySanitizer::sanitize_value(document)
            .as_document()
            .cloned()
            .ok_or_else(|| DocumentStoreError::InvalidDocument("Expected document".into()))?;

        prepared.insert("_id", *id);

        Ok(prepared)
    }

    fn restore_document(&self, mut document: Document) -> Bson {
        document.remove("_id");

        KeySanitizer::restore_value(&Bson::Document(document))
    }

    fn translate_filter(filter: Option<&Expr>) -> DocumentStoreResult<Document> {
        match filter {
            Some(expr) => MongoQueryTranslator::translate(expr),
            None => Ok(doc! {}),
        }
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_documents(&self, documents: Vec<(Uuid, Bson)>, collection: &str) -> DocumentStoreResult<()> {
        if documents.is_empty() {
            return Ok(());
        }

        self.get_collection(collection)
            .insert_many(
                documents
                    .iter()
                    .map(|(id, doc)| self.prepare_document(id, doc))
                    .collect::<DocumentStoreResult<Vec<Document>>>()?,
            )
            .await
            .map_err(|e| write_error(e, collection))?;

        Ok(())
    }

    async fn get_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        Ok(
            self.get_collection(collection)
                .find(doc! { "_id": { "$in": ids } })
                .await
                .map_err(backend_error)?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(backend_error)?
                .into_iter()
                .map(|doc| self.restore_document(doc))
                .collect()
        )
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(limit as i64);
        }
        if let Some(skip) = query.offset {
            options.skip = Some(skip_count(skip));
        }
        if let Some(sort) = &query.sort {
            options.sort = Some(sort_document(&sort.field, sort.direction));
        }

        Ok(
            self.get_collection(collection)
                .find(Self::translate_filter(query.filter.as_ref())?)
                .with_options(options)
                .await
                .map_err(backend_error)?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(backend_error)?
                .into_iter()
                .map(|doc| self.restore_document(doc))
                .collect()
        )
    }

    async fn update_fields(&self, filter: Expr, fields: Document, collection: &str) -> DocumentStoreResult<UpdateOutcome> {
        let filter = MongoQueryTranslator::translate(&filter)?;
        let target = self.get_collection(collection);

        // MongoDB rejects an empty `$set`; nothing can change, so only count matches.
        if fields.is_empty() {
            let matched = target
                .count_documents(filter)
                .await
                .map_err(backend_error)?;

            return Ok(UpdateOutcome { matched, modified: 0 });
        }

        let fields = KeySanitizer::sanitize_value(&Bson::Document(fields));
        let result = target
            .update_many(filter, doc! { "$set": fields })
            .await
            .map_err(|e| write_error(e, collection))?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_documents(&self, filter: Expr, collection: &str) -> DocumentStoreResult<u64> {
        Ok(
            self.get_collection(collection)
                .delete_many(MongoQueryTranslator::translate(&filter)?)
                .await
                .map_err(backend_error)?
                .deleted_count
        )
    }

    async fn aggregate(&self, aggregation: Aggregation, collection: &str) -> DocumentStoreResult<Vec<Bson>> {
        Ok(
            self.get_collection(collection)
                .aggregate(aggregation_pipeline(&aggregation)?)
                .await
                .map_err(backend_error)?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(backend_error)?
                .into_iter()
                .map(|row| self.restore_document(row))
                .collect()
        )
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.get_collection(name)
            .drop()
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn add_index(&self, collection: &str, field: &str, unique: bool) -> DocumentStoreResult<()> {
        self.get_collection(collection)
            .create_index(
                IndexModel::builder()
                .keys(doc! { KeySanitizer::sanitize_key(field): 1 })
                .options(
                    IndexOptions::builder()
                    .unique(unique)
                    .build()
                )
                .build()
            )
            .await
            .map_err(|e| write_error(e, collection))?;

        Ok(())
    }

    async fn ping(&self) -> DocumentStoreResult<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn shutdown(&self) -> DocumentStoreResult<()> {
        self.client
            .clone()
            .shutdown()
            .await;

        Ok(())
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    /// Parses the connection string and creates the client.
    ///
    /// The driver connects lazily, so an unreachable server is only reported by the
    /// first operation (see [`StoreBackend::ping`]).
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(MongoDbStore::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            )
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_is_clamped_to_what_the_server_accepts() {
        assert_eq!(skip_count(40), 40);
        assert_eq!(skip_count(usize::MAX), i64::MAX as u64);
    }

    #[tokio::test]
    async fn prepares_and_restores_documents_around_the_id() {
        let store = MongoDbStoreBuilder::new("mongodb://localhost:27017", "roster_test")
            .build()
            .await
            .unwrap();
        let id = Uuid::new();

        let prepared = store
            .prepare_document(&id, &Bson::Document(doc! { "employee_id": "E001", "a.b": 1 }))
            .unwrap();
        assert_eq!(prepared.get("_id"), Some(&Bson::from(id)));
        assert_eq!(prepared.get_i32("a__dot__b").unwrap(), 1);

        assert_eq!(
            store.restore_document(prepared),
            Bson::Document(doc! { "employee_id": "E001", "a.b": 1 }),
        );
    }

    #[tokio::test]
    async fn rejects_non_document_values() {
        let store = MongoDbStoreBuilder::new("mongodb://localhost:27017", "roster_test")
            .build()
            .await
            .unwrap();

        assert!(matches!(
            store.prepare_document(&Uuid::new(), &Bson::String("nope".into())),
            Err(DocumentStoreError::InvalidDocument(_))
        ));
    }

    #[tokio::test]
    async fn invalid_connection_string_fails_to_build() {
        let result = MongoDbStoreBuilder::new("not-a-url", "roster_test").build().await;

        assert!(matches!(result, Err(DocumentStoreError::Initialization(_))));
    }
}
