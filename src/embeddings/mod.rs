// Embeddings module
// Text-to-vector conversion shared by ingestion and querying

pub mod ollama;

use async_trait::async_trait;

use crate::Result;

pub use ollama::OllamaClient;

/// Maps text into a fixed-dimension vector space.
///
/// Ingestion and querying must use the same model; vectors from different
/// models are not comparable. [`model_name`](Embedder::model_name) is what the
/// vector store records to enforce that.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    /// Verify the model can be used before any work starts
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
