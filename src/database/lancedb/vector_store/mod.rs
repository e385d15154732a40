
use super::{EntryMetadata, IndexedEntry, StoreManifest};
use crate::RagError;
use arrow::array::{Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use itertools::Itertools;
use lancedb::{
    Connection, DistanceType, Table,
    query::{ExecutableQuery, QueryBase},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const TABLE_NAME: &str = "documents";

/// Vector database store using LanceDB for similarity search
pub struct VectorStore {
    connection: Connection,
    table_name: String,
    store_dir: PathBuf,
    embedding_model: String,
    manifest: Option<StoreManifest>,
}

/// Search result from vector similarity search
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub text: String,
    pub metadata: EntryMetadata,
    pub similarity_score: f32,
    pub distance: f32,
}

impl VectorStore {
    /// Open the store for ingestion, creating the directory if needed
    ///
    /// # Arguments
    /// * `store_dir` - Directory holding the LanceDB data and manifest
    /// * `embedding_model` - Model the caller embeds with
    #[inline]
    pub async fn create(store_dir: &Path, embedding_model: &str) -> Result<Self, RagError> {
        Self::ensure_dir(store_dir)?;
        Self::connect(store_dir, embedding_model).await
    }

    /// Open the store with every entry and the manifest removed
    ///
    /// Unlike [`create`](Self::create) this accepts a store built with
    /// another embedding model, since nothing of it survives.
    #[inline]
    pub async fn recreate(store_dir: &Path, embedding_model: &str) -> Result<Self, RagError> {
        Self::ensure_dir(store_dir)?;

        // The old manifest stays on disk until its table is gone
        let mut store = Self::open_connection(store_dir, embedding_model, None).await?;
        store.reset().await?;
        Ok(store)
    }

    fn ensure_dir(store_dir: &Path) -> Result<(), RagError> {
        std::fs::create_dir_all(store_dir).map_err(|e| {
            RagError::Database(format!(
                "Failed to create vector database directory {}: {}",
                store_dir.display(),
                e
            ))
        })
    }

    /// Open a store that a previous ingestion run produced
    ///
    /// A missing directory is reported as a configuration problem rather than
    /// silently creating an empty store.
    #[inline]
    pub async fn open_existing(store_dir: &Path, embedding_model: &str) -> Result<Self, RagError> {
        if !store_dir.is_dir() {
            return Err(RagError::Config(format!(
                "{} not found. Run 'quick-rag ingest' first.",
                store_dir.display()
            )));
        }

        Self::connect(store_dir, embedding_model).await
    }

    async fn connect(store_dir: &Path, embedding_model: &str) -> Result<Self, RagError> {
        debug!("Connecting to LanceDB at path: {:?}", store_dir);

        let manifest = StoreManifest::load(store_dir)?;
        if let Some(manifest) = &manifest {
            manifest.ensure_model(embedding_model)?;
        }

        Self::open_connection(store_dir, embedding_model, manifest).await
    }

    async fn open_connection(
        store_dir: &Path,
        embedding_model: &str,
        manifest: Option<StoreManifest>,
    ) -> Result<Self, RagError> {
        let uri = store_dir.to_string_lossy().to_string();
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        info!("Vector store opened at {}", store_dir.display());
        Ok(Self {
            connection,
            table_name: TABLE_NAME.to_string(),
            store_dir: store_dir.to_path_buf(),
            embedding_model: embedding_model.to_string(),
            manifest,
        })
    }

    #[inline]
    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    #[inline]
    pub fn manifest(&self) -> Option<&StoreManifest> {
        self.manifest.as_ref()
    }

    async fn table_exists(&self) -> Result<bool, RagError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to list tables: {}", e)))?;

        Ok(table_names.contains(&self.table_name))
    }

    async fn open_table(&self) -> Result<Option<Table>, RagError> {
        if !self.table_exists().await? {
            return Ok(None);
        }

        self.connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map(Some)
            .map_err(|e| RagError::Database(format!("Failed to open table: {}", e)))
    }

    /// Create schema with the specified vector dimension
    fn create_schema(vector_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    vector_dim as i32,
                ),
                false,
            ),
            Field::new("text", DataType::Utf8, false),
            Field::new("source", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, false),
            Field::new("created_at", DataType::Utf8, false),
        ]))
    }

    /// Persist entries, skipping any whose id is already stored
    ///
    /// The manifest is written before the first row so a table never exists
    /// without a recorded model.
    ///
    /// # Returns
    /// * `Result<usize, RagError>` - Number of entries actually inserted
    #[inline]
    pub async fn add_entries(&mut self, entries: Vec<IndexedEntry>) -> Result<usize, RagError> {
        if entries.is_empty() {
            debug!("No entries to store");
            return Ok(0);
        }

        let vector_dim = entries[0].vector.len();
        if vector_dim == 0 {
            return Err(RagError::Database("Cannot store empty vectors".to_string()));
        }
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != vector_dim) {
            return Err(RagError::Database(format!(
                "Inconsistent vector dimensions in batch: {} vs {} (entry {})",
                vector_dim,
                bad.vector.len(),
                bad.id
            )));
        }
        self.ensure_dimension(vector_dim)?;

        let entries: Vec<IndexedEntry> = entries.into_iter().unique_by(|e| e.id.clone()).collect();
        debug!("Storing batch of {} entries", entries.len());

        if self.manifest.is_none() {
            let manifest = StoreManifest::new(&self.embedding_model, vector_dim);
            manifest.save(&self.store_dir)?;
            self.manifest = Some(manifest);
        }

        let table = match self.open_table().await? {
            Some(table) => table,
            None => {
                info!("Creating {} table with {} dimensions", self.table_name, vector_dim);
                self.connection
                    .create_empty_table(&self.table_name, Self::create_schema(vector_dim))
                    .execute()
                    .await
                    .map_err(|e| RagError::Database(format!("Failed to create table: {}", e)))?
            }
        };

        let before = Self::row_count(&table).await?;
        let record_batch = Self::create_record_batch(&entries, vector_dim)?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);

        let mut merge = table.merge_insert(&["id"]);
        merge.when_not_matched_insert_all();
        merge
            .execute(Box::new(reader))
            .await
            .map_err(|e| RagError::Database(format!("Failed to insert entries: {}", e)))?;

        let inserted = Self::row_count(&table).await?.saturating_sub(before);
        info!(
            "Stored {} new entries ({} already present)",
            inserted,
            entries.len().saturating_sub(inserted)
        );
        Ok(inserted)
    }

    async fn row_count(table: &Table) -> Result<usize, RagError> {
        table
            .count_rows(None)
            .await
            .map_err(|e| RagError::Database(format!("Failed to count rows: {}", e)))
    }

    fn ensure_dimension(&self, vector_dim: usize) -> Result<(), RagError> {
        match &self.manifest {
            Some(manifest) if manifest.embedding_dimension != vector_dim => {
                Err(RagError::Database(format!(
                    "Vector dimension mismatch: store holds {} dimensions, got {}",
                    manifest.embedding_dimension, vector_dim
                )))
            }
            _ => Ok(()),
        }
    }

    /// Create a RecordBatch from indexed entries
    fn create_record_batch(
        entries: &[IndexedEntry],
        vector_dim: usize,
    ) -> Result<RecordBatch, RagError> {
        let len = entries.len();

        let mut ids = Vec::with_capacity(len);
        let mut texts = Vec::with_capacity(len);
        let mut sources = Vec::with_capacity(len);
        let mut titles = Vec::with_capacity(len);
        let mut created_ats = Vec::with_capacity(len);
        let mut flat_values = Vec::with_capacity(len * vector_dim);

        for entry in entries {
            ids.push(entry.id.as_str());
            texts.push(entry.text.as_str());
            sources.push(entry.metadata.source.as_str());
            titles.push(entry.metadata.title.as_str());
            created_ats.push(entry.created_at.as_str());
            flat_values.extend_from_slice(&entry.vector);
        }

        let values_array = Float32Array::from(flat_values);
        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let vector_array =
            FixedSizeListArray::try_new(field, vector_dim as i32, Arc::new(values_array), None)
                .map_err(|e| RagError::Database(format!("Failed to create vector array: {}", e)))?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(texts)),
            Arc::new(StringArray::from(sources)),
            Arc::new(StringArray::from(titles)),
            Arc::new(StringArray::from(created_ats)),
        ];

        RecordBatch::try_new(Self::create_schema(vector_dim), arrays)
            .map_err(|e| RagError::Database(format!("Failed to create record batch: {}", e)))
    }

    /// Return the `limit` entries nearest to `query_vector` by cosine distance
    ///
    /// An empty store yields no results rather than an error.
    #[inline]
    pub async fn search_similar(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>, RagError> {
        debug!("Searching for similar vectors with limit: {}", limit);

        if let Some(manifest) = &self.manifest {
            if manifest.embedding_dimension != query_vector.len() {
                return Err(RagError::Database(format!(
                    "Query vector has {} dimensions but the store holds {}",
                    query_vector.len(),
                    manifest.embedding_dimension
                )));
            }
        }

        let Some(table) = self.open_table().await? else {
            debug!("Table {} does not exist yet, nothing to search", self.table_name);
            return Ok(Vec::new());
        };

        let results = table
            .vector_search(query_vector)
            .map_err(|e| RagError::Database(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .distance_type(DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to execute search: {}", e)))?;

        let mut search_results = Self::parse_search_results_stream(results).await?;
        search_results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        search_results.truncate(limit);
        Ok(search_results)
    }

    async fn parse_search_results_stream(
        mut results: lancedb::arrow::SendableRecordBatchStream,
    ) -> Result<Vec<SearchResult>, RagError> {
        let mut search_results = Vec::new();

        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| RagError::Database(format!("Failed to read result stream: {}", e)))?
        {
            search_results.extend(Self::parse_search_batch(&batch)?);
        }

        debug!("Parsed {} search results from stream", search_results.len());
        Ok(search_results)
    }

    fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, RagError> {
        batch
            .column_by_name(name)
            .ok_or_else(|| RagError::Database(format!("Missing {} column", name)))?
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| RagError::Database(format!("Invalid {} column type", name)))
    }

    fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchResult>, RagError> {
        let texts = Self::string_column(batch, "text")?;
        let sources = Self::string_column(batch, "source")?;
        let titles = Self::string_column(batch, "title")?;

        let distances = batch
            .column_by_name("_distance")
            .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

        let results = (0..batch.num_rows())
            .map(|row| {
                let distance =
                    distances.map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

                SearchResult {
                    text: texts.value(row).to_string(),
                    metadata: EntryMetadata {
                        source: sources.value(row).to_string(),
                        title: titles.value(row).to_string(),
                    },
                    // Cosine distance is 1 - cosine similarity
                    similarity_score: 1.0 - distance,
                    distance,
                }
            })
            .collect();

        Ok(results)
    }

    /// Get the total number of stored entries
    #[inline]
    pub async fn count_entries(&self) -> Result<u64, RagError> {
        let Some(table) = self.open_table().await? else {
            return Ok(0);
        };

        Ok(Self::row_count(&table).await? as u64)
    }

    /// Drop every entry and forget the recorded embedding model
    #[inline]
    pub async fn reset(&mut self) -> Result<(), RagError> {
        if self.table_exists().await? {
            info!("Dropping existing {} table", self.table_name);
            self.connection
                .drop_table(&self.table_name)
                .await
                .map_err(|e| RagError::Database(format!("Failed to drop table: {}", e)))?;
        }

        StoreManifest::remove(&self.store_dir)?;
        self.manifest = None;
        Ok(())
    }
}
