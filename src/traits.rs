use async_trait::async_trait;

use crate::document::{Document, DocumentId, Fields, Query};
use crate::error::StoreError;

/// A remote document database, made of named collections of documents.
///
/// Every call may be slow, and may fail (network or permission issues, missing documents...)
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a new document, and return the id the store assigned to it
    async fn create(&self, collection: &str, fields: Fields) -> Result<DocumentId, StoreError>;

    /// Returns the documents of a collection that match every filter of `query`, in the requested order
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Overwrite some fields of an existing document. Fields that are not in `fields` are left as is.
    ///
    /// This fails if the document does not exist
    async fn update(&self, collection: &str, id: &DocumentId, fields: Fields) -> Result<(), StoreError>;

    /// Delete a document. This fails if the document does not exist
    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError>;
}
