#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::{Credentials, WatsonxConfig};
use crate::{Result, SahayError};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
/// watsonx.ai REST API version pin.
pub const API_VERSION: &str = "2023-05-29";

/// Client for the hosted watsonx.ai text-embeddings endpoint.
///
/// Construct one per process and pass it explicitly to callers; the
/// underlying agent is reused for every request. Embeddings are
/// deterministic for identical input and model version.
#[derive(Debug, Clone)]
pub struct WatsonxEmbedder {
    base_url: Url,
    model: String,
    project_id: String,
    api_key: String,
    batch_size: u32,
    dimension: usize,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model_id: &'a str,
    project_id: &'a str,
    inputs: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    results: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl WatsonxEmbedder {
    #[inline]
    pub fn new(config: &WatsonxConfig, credentials: &Credentials) -> Result<Self> {
        let base_url = config
            .endpoint_url()
            .map_err(|e| SahayError::Config(e.to_string()))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
            model: config.embedding_model.clone(),
            project_id: credentials.project_id.clone(),
            api_key: credentials.api_key.clone(),
            batch_size: config.batch_size,
            dimension: config.embedding_dimension as usize,
            agent,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    /// The configured embedding dimensionality.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embed a single text, e.g. a user query.
    #[inline]
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let texts = [text.to_string()];
        let mut vectors = self.embed_batch(&texts)?;
        vectors
            .pop()
            .ok_or_else(|| SahayError::Embedding("Service returned no embedding".to_string()))
    }

    /// Embed many texts, slicing the requests into `batch_size` groups.
    #[inline]
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(SahayError::Embedding(
                "Cannot embed empty text".to_string(),
            ));
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut vectors = Vec::with_capacity(texts.len());
        for group in texts.chunks(self.batch_size as usize) {
            vectors.extend(self.request_embeddings(group)?);
        }

        debug!("Generated {} embeddings total", vectors.len());
        Ok(vectors)
    }

    fn request_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model_id: &self.model,
            project_id: &self.project_id,
            inputs: texts,
        };

        let mut url = self
            .base_url
            .join("/ml/v1/text/embeddings")
            .map_err(|e| SahayError::Embedding(format!("Failed to build embedding URL: {}", e)))?;
        url.set_query(Some(&format!("version={}", API_VERSION)));

        let request_json = serde_json::to_string(&request).map_err(|e| {
            SahayError::Embedding(format!("Failed to serialize embedding request: {}", e))
        })?;

        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| SahayError::Embedding(describe_http_error(&e)))?;

        let response: EmbeddingResponse = serde_json::from_str(&response_text).map_err(|e| {
            SahayError::Embedding(format!("Failed to parse embedding response: {}", e))
        })?;

        if response.results.len() != texts.len() {
            return Err(SahayError::Embedding(format!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                response.results.len()
            )));
        }

        let mut vectors = Vec::with_capacity(response.results.len());
        for data in response.results {
            if data.embedding.len() != self.dimension {
                return Err(SahayError::Embedding(format!(
                    "Embedding dimensionality mismatch: expected {}, got {}",
                    self.dimension,
                    data.embedding.len()
                )));
            }
            vectors.push(data.embedding);
        }

        Ok(vectors)
    }
}

/// Turn a transport-level failure into the message surfaced to callers.
pub(crate) fn describe_http_error(error: &ureq::Error) -> String {
    match error {
        ureq::Error::StatusCode(status) if *status == 401 || *status == 403 => {
            format!("Authentication with watsonx.ai failed (HTTP {})", status)
        }
        ureq::Error::StatusCode(status) => format!("Service error: HTTP {}", status),
        ureq::Error::ConnectionFailed | ureq::Error::HostNotFound => {
            format!("Could not reach watsonx.ai: {}", error)
        }
        ureq::Error::Timeout(_) => format!("Request to watsonx.ai timed out: {}", error),
        _ => format!("Request failed: {}", error),
    }
}
