// Retrieval-augmented answering
// Embeds a question, retrieves the nearest entries and asks the hosted LLM

pub mod prompt;

#[cfg(test)]
mod tests;

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::database::lancedb::{SearchResult, VectorStore};
use crate::embeddings::{Embedder, OllamaClient};
use crate::llm::{ChatModel, GroqClient};
use crate::{RagError, Result};

pub use prompt::{DEFAULT_TEMPLATE, PromptTemplate};

pub const DEFAULT_TOP_K: usize = 3;

/// Characters of entry text shown in a source preview
pub const PREVIEW_CHARS: usize = 200;

/// Generated answer with the entries it was grounded on, nearest first
#[derive(Debug, Clone)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SearchResult>,
}

/// Stateless question-answering pipeline over a persisted store
///
/// Built once at startup and shared behind an `Arc`; every call to
/// [`answer`](Self::answer) is independent.
pub struct RetrievalChain {
    embedder: Arc<dyn Embedder>,
    store: VectorStore,
    llm: Arc<dyn ChatModel>,
    prompt: PromptTemplate,
    top_k: usize,
}

impl RetrievalChain {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>, store: VectorStore, llm: Arc<dyn ChatModel>) -> Self {
        Self {
            embedder,
            store,
            llm,
            prompt: PromptTemplate::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    #[inline]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    #[inline]
    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    /// Build the chain from configuration
    ///
    /// Fails when the credential is missing, the store has not been
    /// ingested yet, or the embedding server cannot serve the configured model.
    #[inline]
    pub async fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .api_key()
            .map_err(|e| RagError::Config(e.to_string()))?;

        let embedder = OllamaClient::new(&config.ollama)
            .map_err(|e| RagError::Config(format!("{:#}", e)))?;
        let store = VectorStore::open_existing(config.store_dir(), embedder.model()).await?;
        embedder.health_check().await?;

        let llm = GroqClient::new(&config.llm, api_key);
        info!(
            "RAG chain ready: embeddings={}, llm={}, top_k={}",
            embedder.model(),
            llm.model_name(),
            config.retrieval.top_k
        );

        Ok(Self::new(Arc::new(embedder), store, Arc::new(llm))
            .with_top_k(config.retrieval.top_k))
    }

    #[inline]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    #[inline]
    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Answer one question
    ///
    /// # Errors
    /// [`RagError::Retrieval`] when embedding the question or searching the
    /// store fails, [`RagError::Generation`] when the LLM call fails.
    #[inline]
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let query_vector = self
            .embedder
            .embed_query(question)
            .await
            .map_err(|e| RagError::Retrieval(format!("Failed to embed question: {}", e)))?;

        let sources = self
            .store
            .search_similar(&query_vector, self.top_k)
            .await
            .map_err(|e| RagError::Retrieval(format!("Failed to search vector store: {}", e)))?;
        debug!("Retrieved {} entries for question", sources.len());

        let context: Vec<&str> = sources.iter().map(|s| s.text.as_str()).collect();
        let prompt = self.prompt.render(&context, question);

        let answer = self.llm.complete(&prompt).await.map_err(|e| match e {
            RagError::Generation(message) => RagError::Generation(message),
            other => RagError::Generation(other.to_string()),
        })?;

        Ok(Answer { answer, sources })
    }
}

/// Final path component of an entry's source, as shown to users
#[inline]
pub fn source_file_name(source: &str) -> String {
    Path::new(source)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// First [`PREVIEW_CHARS`] characters of `text` followed by an ellipsis
#[inline]
pub fn content_preview(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}
