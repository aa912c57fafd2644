use crate::cache::EmbeddingCache;
use crate::embeddings::Embedder;
use crate::error::{RegassistError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// OpenAI caps a single embeddings request at 2048 inputs.
const MAX_BATCH: usize = 2048;

/// Request structure for OpenAI embeddings API
#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    /// Truncated output size; only text-embedding-3 models accept it.
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

/// Response structure from OpenAI embeddings API
#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// OpenAI embeddings client
///
/// Batches evidence chunks, retries single-sentence embeds on rate limits and
/// server errors, and optionally caches single-text embeddings.
pub struct OpenAIEmbedder {
    client: Client,
    api_key: String,
    model: String,
    batch_size: usize,
    dimensions: Option<usize>,
    max_retries: usize,
    cache: Option<Arc<EmbeddingCache>>,
}

impl OpenAIEmbedder {
    /// Create a new embedder; `batch_size` is capped at 2048.
    pub fn new(api_key: String, model: String, batch_size: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RegassistError::Embedding(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model,
            batch_size: batch_size.clamp(1, MAX_BATCH),
            dimensions: None,
            max_retries: 3,
            cache: None,
        })
    }

    /// Attach an LRU cache consulted by [`Embedder::embed`].
    pub fn with_cache(mut self, cache: Arc<EmbeddingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Ask the API for vectors of this length instead of the model default.
    pub fn with_dimensions(mut self, dimensions: Option<usize>) -> Self {
        self.dimensions = dimensions;
        self
    }

    fn build_request<'a>(&'a self, texts: &'a [String]) -> EmbeddingRequest<'a> {
        EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.dimensions,
        }
    }

    /// Single API request for up to `batch_size` texts.
    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = self.build_request(texts);

        let response = self
            .client
            .post(EMBEDDINGS_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RegassistError::Embedding(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(RegassistError::Embedding(format!(
                "OpenAI API error {}: {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| RegassistError::Embedding(format!("Failed to parse response: {}", e)))?;

        align_response(result.data, texts.len())
    }

    async fn embed_with_retry(&self, text: &str) -> Result<Vec<f32>> {
        let start = std::time::Instant::now();
        let input = [text.to_string()];
        let mut attempt = 0;
        let mut delay = Duration::from_secs(1);

        loop {
            match self.request(&input).await {
                Ok(mut embeddings) => {
                    log::debug!("Embedding API call took {:?} (attempt {})", start.elapsed(), attempt + 1);
                    return embeddings
                        .pop()
                        .ok_or_else(|| RegassistError::Embedding("Empty response from OpenAI API".to_string()));
                }
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    log::warn!("Retry {}/{} after error: {}", attempt + 1, self.max_retries, e);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(text) {
                log::debug!("Embedding cache hit ({} chars)", text.len());
                return Ok(cached);
            }
        }

        let embedding = self.embed_with_retry(text).await?;

        if let Some(cache) = &self.cache {
            cache.put(text.to_string(), embedding.clone());
        }
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut all = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            all.extend(self.request(chunk).await?);

            // Rate limiting: small delay between full batches
            if chunk.len() == self.batch_size {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
        Ok(all)
    }
}

/// Rate limits (429) and server errors (5xx) are worth retrying.
fn is_retryable(err: &RegassistError) -> bool {
    let msg = err.to_string();
    ["429", "500", "502", "503", "504"].iter().any(|code| msg.contains(code))
}

/// Order embeddings by their response index and check the count.
fn align_response(mut data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(RegassistError::Embedding(format!(
            "Expected {} embeddings, got {}",
            expected,
            data.len()
        )));
    }
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}
