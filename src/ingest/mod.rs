// Ingestion module
// Turns a directory of JSON documents into a persisted vector store

pub mod loader;


use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::database::lancedb::{EntryMetadata, IndexedEntry, VectorStore};
use crate::embeddings::Embedder;
use crate::{RagError, Result};

pub use loader::{Record, load_documents};

const DEFAULT_BATCH_SIZE: usize = 64;

/// Outcome of one ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestStats {
    pub documents_loaded: usize,
    /// Rows newly inserted by this run
    pub entries_stored: usize,
    /// Entry count after the run, including entries from earlier runs
    pub total_entries: u64,
}

/// Embeds records and writes them to the store directory
pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    store_dir: PathBuf,
    batch_size: usize,
}

impl Indexer {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>, store_dir: &Path) -> Self {
        Self {
            embedder,
            store_dir: store_dir.to_path_buf(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    #[inline]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Load `dataset_dir`, embed every record and persist the entries
    ///
    /// Nothing is created on disk when the dataset holds no records.
    ///
    /// # Errors
    /// [`RagError::EmptyDataset`] when no records were loaded, otherwise the
    /// loader, embedder or store error that stopped the run.
    #[inline]
    pub async fn ingest(&self, dataset_dir: &Path, rebuild: bool) -> Result<IngestStats> {
        let records = load_documents(dataset_dir)?;
        if records.is_empty() {
            return Err(RagError::EmptyDataset(dataset_dir.display().to_string()));
        }

        self.embedder.health_check().await?;

        let model = self.embedder.model_name();
        let mut store = if rebuild {
            info!("Rebuilding vector store at {}", self.store_dir.display());
            VectorStore::recreate(&self.store_dir, model).await?
        } else {
            VectorStore::create(&self.store_dir, model).await?
        };

        let bar = progress_bar(records.len());
        let mut entries_stored = 0;

        for batch in records.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(Record::text).collect();
            let vectors = self.embedder.embed_documents(&texts).await?;
            if vectors.len() != texts.len() {
                return Err(RagError::Ingest(format!(
                    "Embedder returned {} vectors for {} documents",
                    vectors.len(),
                    texts.len()
                )));
            }

            let entries = batch
                .iter()
                .zip(texts)
                .zip(vectors)
                .map(|((record, text), vector)| {
                    IndexedEntry::new(
                        text,
                        vector,
                        EntryMetadata {
                            source: record.source_path.clone(),
                            title: record.title.clone(),
                        },
                    )
                })
                .collect();

            entries_stored += store.add_entries(entries).await?;
            bar.inc(batch.len() as u64);
            debug!("Embedded batch of {} documents", batch.len());
        }
        bar.finish_and_clear();

        let total_entries = store.count_entries().await?;
        info!(
            "Ingestion complete: {} documents, {} entries in store",
            records.len(),
            total_entries
        );

        Ok(IngestStats {
            documents_loaded: records.len(),
            entries_stored,
            total_entries,
        })
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    if !console::user_attended_stderr() {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::with_template("{spinner} [{pos}/{len}] Embedding documents {wide_bar}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    ProgressBar::new(len as u64).with_style(style)
}
