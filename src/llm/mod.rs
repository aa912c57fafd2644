//! Generation collaborator: the `Generator` contract, an OpenAI chat client,
//! and the prompt builders used by the pipeline.

pub mod openai;
pub mod prompts;

pub use openai::OpenAIChat;

use crate::error::Result;
use std::future::Future;

/// Produces text from a system prompt and a user prompt.
pub trait Generator: Send + Sync {
    fn complete(&self, system_prompt: &str, user_prompt: &str) -> impl Future<Output = Result<String>> + Send;
}
