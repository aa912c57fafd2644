//! Embedding collaborator: the `Embedder` contract and its OpenAI client.

pub mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use std::future::Future;

/// Turns text into fixed-length vectors.
///
/// Whether an embedder may be called at all is decided by
/// [`Availability`](crate::availability::Availability); implementations only
/// deal with transport failures.
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>>> + Send;

    /// Embed several texts; the output is aligned 1:1 with `texts`.
    fn embed_batch(&self, texts: &[String]) -> impl Future<Output = Result<Vec<Vec<f32>>>> + Send;
}
