use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::RagError;

const MANIFEST_FILE: &str = "manifest.toml";

/// Records which embedding model built a store.
///
/// Vectors from different models are not comparable, so a store is only ever
/// extended or queried with the model named here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreManifest {
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub created_at: String,
}

impl StoreManifest {
    #[inline]
    pub fn new(embedding_model: &str, embedding_dimension: usize) -> Self {
        Self {
            embedding_model: embedding_model.to_string(),
            embedding_dimension,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[inline]
    pub fn path(store_dir: &Path) -> PathBuf {
        store_dir.join(MANIFEST_FILE)
    }

    /// Read the manifest, `None` when the store has never been written to
    pub fn load(store_dir: &Path) -> Result<Option<Self>, RagError> {
        let path = Self::path(store_dir);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        toml::from_str(&content).map(Some).map_err(|e| {
            RagError::Database(format!(
                "Failed to parse store manifest {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn save(&self, store_dir: &Path) -> Result<(), RagError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RagError::Database(format!("Failed to serialize manifest: {}", e)))?;
        fs::write(Self::path(store_dir), content)?;
        Ok(())
    }

    pub fn remove(store_dir: &Path) -> Result<(), RagError> {
        let path = Self::path(store_dir);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Refuse to mix vectors from a different embedding model
    pub fn ensure_model(&self, embedding_model: &str) -> Result<(), RagError> {
        if self.embedding_model != embedding_model {
            return Err(RagError::Config(format!(
                "Vector store was built with embedding model '{}' but '{}' is configured. \
                 Re-run ingestion with --rebuild or restore the original model.",
                self.embedding_model, embedding_model
            )));
        }
        Ok(())
    }
}
