//! Client for OpenAI-compatible `/v1/embeddings` endpoints.

use doclayout_core::{PrecomputedEmbeddings, RankingError};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
pub const DEFAULT_EMBEDDINGS_MODEL: &str = "text-embedding-3-small";

#[derive(Debug, Clone, clap::Args)]
pub struct EmbeddingOptions {
    /// Embeddings endpoint (OpenAI-compatible)
    #[arg(long, env = "DOCLAYOUT_EMBEDDINGS_URL", default_value = DEFAULT_EMBEDDINGS_URL)]
    pub embeddings_url: String,

    /// Embedding model name
    #[arg(long, env = "DOCLAYOUT_EMBEDDINGS_MODEL", default_value = DEFAULT_EMBEDDINGS_MODEL)]
    pub embeddings_model: String,

    /// API key sent as a bearer token
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

pub struct EmbeddingClient {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl EmbeddingClient {
    pub fn new(options: &EmbeddingOptions) -> Self {
        Self {
            client: Client::new(),
            url: options.embeddings_url.clone(),
            model: options.embeddings_model.clone(),
            api_key: options.api_key.clone(),
        }
    }

    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RankingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self.client.post(&self.url).json(&EmbeddingRequest {
            input: texts,
            model: &self.model,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RankingError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RankingError::Unavailable(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| RankingError::InvalidResponse(e.to_string()))?;

        order_embeddings(body, texts.len())
    }

    /// Embed the candidate texts and the query in a single request.
    pub async fn precompute(
        &self,
        texts: &[String],
        query: &str,
    ) -> Result<PrecomputedEmbeddings, RankingError> {
        let mut input = texts.to_vec();
        input.push(query.to_string());

        let mut vectors = self.embed_batch(&input).await?;
        let query = vectors
            .pop()
            .ok_or_else(|| RankingError::InvalidResponse("empty response".to_string()))?;

        log::debug!(
            "embedded {} candidates with {} dimensions",
            vectors.len(),
            query.len()
        );
        Ok(PrecomputedEmbeddings {
            candidates: vectors,
            query,
        })
    }
}

/// Put embeddings back in input order and check that none is missing.
fn order_embeddings(
    mut body: EmbeddingResponse,
    expected: usize,
) -> Result<Vec<Vec<f32>>, RankingError> {
    if body.data.len() != expected {
        return Err(RankingError::InvalidResponse(format!(
            "expected {} embeddings, got {}",
            expected,
            body.data.len()
        )));
    }
    body.data.sort_by_key(|d| d.index);
    Ok(body.data.into_iter().map(|d| d.embedding).collect())
}
