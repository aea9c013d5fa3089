// src/assistant/mod.rs
pub mod conversation;
pub mod engine;

pub use conversation::{ConversationError, ConversationStore, MessageRole};
pub use engine::{AssistantError, AssistantReply, ChatAssistant, FALLBACK_MESSAGE};

/// Client interface for the generative text endpoint.
#[async_trait::async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}
