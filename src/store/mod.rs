//! In-memory document store
//!
//! Ordered collection of the documents ingested in this session. Insertion
//! order is completion order. Nothing here touches disk.

use crate::error::{Error, Result};
use crate::models::{generate_document_id, Document};
use tracing::debug;

#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn contains(&self, id: &str) -> bool {
        self.documents.iter().any(|doc| doc.id == id)
    }

    /// Generate an id unused by this store and not `reserved` elsewhere
    pub fn fresh_id(&self, reserved: impl Fn(&str) -> bool) -> String {
        loop {
            let id = generate_document_id();
            if !self.contains(&id) && !reserved(&id) {
                return id;
            }
        }
    }

    /// Register a document. Ids are never reused within a store.
    pub fn insert(&mut self, document: Document) -> Result<()> {
        if self.contains(&document.id) {
            return Err(Error::Ingestion(format!(
                "Duplicate document id '{}'",
                document.id
            )));
        }
        debug!(id = %document.id, name = %document.name, "Registered document");
        self.documents.push(document);
        Ok(())
    }

    /// Remove a document by id, returning it
    pub fn remove(&mut self, id: &str) -> Result<Document> {
        let index = self
            .documents
            .iter()
            .position(|doc| doc.id == id)
            .ok_or_else(|| Error::DocumentNotFound(id.to_string()))?;
        Ok(self.documents.remove(index))
    }
}
