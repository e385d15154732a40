// Hosted LLM module
// Answer generation behind a small trait so the chain can be driven by any provider

pub mod groq;

use async_trait::async_trait;

use crate::Result;

pub use groq::GroqClient;

#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Send a fully rendered prompt as a single user turn and return the reply text
    async fn complete(&self, prompt: &str) -> Result<String>;
}
