// LanceDB vector database module
// Handles vector storage and similarity search for embedded documents


pub mod manifest;
pub mod vector_store;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use manifest::StoreManifest;
pub use vector_store::{SearchResult, VectorStore};

/// Entry stored in LanceDB, one per ingested document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedEntry {
    /// Content-derived identifier, identical across ingestion runs
    pub id: String,
    /// The text that was embedded
    pub text: String,
    /// Embedding of `text`
    pub vector: Vec<f32>,
    pub metadata: EntryMetadata,
    /// Timestamp when this entry was created
    pub created_at: String,
}

/// Citation data stored alongside each embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Path of the file the document was loaded from
    pub source: String,
    pub title: String,
}

impl IndexedEntry {
    #[inline]
    pub fn new(text: String, vector: Vec<f32>, metadata: EntryMetadata) -> Self {
        let id = Self::content_id(&metadata, &text);
        Self {
            id,
            text,
            vector,
            metadata,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Deterministic id so that re-ingesting the same document maps onto the same row
    #[inline]
    pub fn content_id(metadata: &EntryMetadata, text: &str) -> String {
        let key = format!("{}\u{1f}{}\u{1f}{}", metadata.source, metadata.title, text);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
    }
}
