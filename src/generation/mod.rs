
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::{Credentials, WatsonxConfig};
use crate::embeddings::watsonx::{API_VERSION, describe_http_error};
use crate::{Result, SahayError};

const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

// Fixed generation parameters; these are not configurable.
const MAX_NEW_TOKENS: u32 = 512;
const TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 0.9;
const REPETITION_PENALTY: f32 = 1.1;

const SYSTEM_INSTRUCTION: &str = "You are Sahay AI, a helpful assistant answering questions about \
the Pradhan Mantri Kisan Samman Nidhi (PM-KISAN) scheme.

INSTRUCTIONS:
- Answer the question based ONLY on the context below, taken from the official scheme document.
- If the context does not cover the question, reply: \"I'm sorry, the official rules document \
does not provide information on that topic.\"
- Keep answers simple, clear, and in plain language that farmers can easily understand.
- Cite specific details from the document when available.";

/// Client for the hosted watsonx.ai text-generation endpoint.
#[derive(Debug, Clone)]
pub struct WatsonxGenerator {
    base_url: Url,
    model: String,
    project_id: String,
    api_key: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model_id: &'a str,
    project_id: &'a str,
    input: &'a str,
    parameters: GenerationParameters,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    repetition_penalty: f32,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    results: Vec<GenerationData>,
}

#[derive(Debug, Deserialize)]
struct GenerationData {
    generated_text: String,
}

/// Assemble the grounded prompt sent to the model: the fixed instruction,
/// the retrieved context blocks in retrieval order, then the question.
#[inline]
pub fn build_prompt(question: &str, contexts: &[String]) -> String {
    let context_text = contexts.join("\n\n");
    format!(
        "{}\n\nCONTEXT FROM THE OFFICIAL PM-KISAN DOCUMENT:\n{}\n\nUSER QUESTION: {}\n\nSAHAY AI RESPONSE:",
        SYSTEM_INSTRUCTION, context_text, question
    )
}

impl WatsonxGenerator {
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
            model: config.generation_model.clone(),
            project_id: credentials.project_id.clone(),
            api_key: credentials.api_key.clone(),
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

    /// Generate an answer to `question` grounded in `contexts`.
    ///
    /// Network failure, authentication failure, and an empty model response
    /// all surface as [`SahayError::Generation`].
    #[inline]
    pub fn generate(&self, question: &str, contexts: &[String]) -> Result<String> {
        let prompt = build_prompt(question, contexts);
        debug!(
            "Requesting generation for a prompt of {} characters",
            prompt.len()
        );

        let request = GenerationRequest {
            model_id: &self.model,
            project_id: &self.project_id,
            input: &prompt,
            parameters: GenerationParameters {
                max_new_tokens: MAX_NEW_TOKENS,
                temperature: TEMPERATURE,
                top_p: TOP_P,
                repetition_penalty: REPETITION_PENALTY,
            },
        };

        let mut url = self
            .base_url
            .join("/ml/v1/text/generation")
            .map_err(|e| SahayError::Generation(format!("Failed to build generation URL: {}", e)))?;
        url.set_query(Some(&format!("version={}", API_VERSION)));

        let request_json = serde_json::to_string(&request).map_err(|e| {
            SahayError::Generation(format!("Failed to serialize generation request: {}", e))
        })?;

        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| SahayError::Generation(describe_http_error(&e)))?;

        let response: GenerationResponse = serde_json::from_str(&response_text).map_err(|e| {
            SahayError::Generation(format!("Failed to parse generation response: {}", e))
        })?;

        let answer = response
            .results
            .into_iter()
            .next()
            .map(|data| data.generated_text.trim().to_string())
            .unwrap_or_default();

        if answer.is_empty() {
            return Err(SahayError::Generation(
                "Model returned an empty response".to_string(),
            ));
        }

        debug!("Received generated answer of {} characters", answer.len());
        Ok(answer)
    }
}
