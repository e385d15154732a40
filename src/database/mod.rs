// Database module
// LanceDB holds the embedded entries and answers nearest-neighbour queries

pub mod lancedb;

pub use lancedb::{EntryMetadata, IndexedEntry, SearchResult, StoreManifest, VectorStore};
