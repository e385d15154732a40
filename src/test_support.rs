// Deterministic stand-ins for the embedding model and the hosted LLM

use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;

use crate::embeddings::Embedder;
use crate::llm::ChatModel;
use crate::{RagError, Result};

pub(crate) const HASHING_DIMENSION: usize = 256;

/// Bag-of-words embedder: each lowercase alphanumeric token is hashed into a bucket
pub(crate) struct HashingEmbedder {
    model: String,
}

impl HashingEmbedder {
    pub(crate) fn new() -> Self {
        Self::named("hashing-test-model")
    }

    pub(crate) fn named(model: &str) -> Self {
        Self {
            model: model.to_string(),
        }
    }

    pub(crate) fn vectorize(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; HASHING_DIMENSION];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = fnv1a(&token.to_lowercase()) as usize % HASHING_DIMENSION;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        } else {
            vector[0] = 1.0;
        }
        vector
    }
}

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vectorize(text))
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }
}

/// Embedder whose every call fails, including the health check
pub(crate) struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn model_name(&self) -> &str {
        "hashing-test-model"
    }

    async fn health_check(&self) -> Result<()> {
        Err(RagError::Embedding("embedding server unreachable".to_string()))
    }

    async fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::Embedding("embedding server unreachable".to_string()))
    }

    async fn embed_documents(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(RagError::Embedding("embedding server unreachable".to_string()))
    }
}

/// Chat model that returns a fixed reply and records every prompt it receives
pub(crate) struct CannedChatModel {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl CannedChatModel {
    pub(crate) fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log poisoned").clone()
    }
}

#[async_trait]
impl ChatModel for CannedChatModel {
    fn model_name(&self) -> &str {
        "canned"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .expect("prompt log poisoned")
            .push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

pub(crate) struct FailingChatModel;

#[async_trait]
impl ChatModel for FailingChatModel {
    fn model_name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(RagError::Generation("LLM API returned HTTP 503: over capacity".to_string()))
    }
}

/// Write `content` to `dir/name`, creating `dir` if needed
pub(crate) fn write_dataset_file(dir: &Path, name: &str, content: &str) {
    std::fs::create_dir_all(dir).expect("should create dataset dir");
    std::fs::write(dir.join(name), content).expect("should write dataset file");
}

/// Three manuals with disjoint vocabulary, one per file
pub(crate) fn write_manuals(dir: &Path) {
    write_dataset_file(
        dir,
        "infusion.json",
        r#"[{"title": "Infusion Pump Manual", "content": "Prime the infusion pump tubing before connecting the patient line."}]"#,
    );
    write_dataset_file(
        dir,
        "monitor.json",
        r#"{"title": "Heart Monitor Guide", "content": ["Attach electrodes to clean skin.", "Check the ECG waveform."]}"#,
    );
    write_dataset_file(
        dir,
        "ventilator.json",
        r#"[{"title": "Ventilator Handbook", "content": "Set tidal volume and respiratory rate on the ventilator panel."}]"#,
    );
}
