//! Remote capability speaking a small JSON protocol.
//!
//! `POST {base}/v1/embeddings` and `POST {base}/v1/complete`, bearer-less
//! and model-agnostic; any gateway that implements the two routes works.
//! Transport failures map onto [`CapabilityError`] so the pipeline can
//! degrade instead of surfacing provider detail to callers.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capability::{CapabilityError, CompletionRequest, LanguageCapability};
use crate::lexical::normalize;

pub struct RemoteCapability {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dim: usize,
    timeout: Duration,
}

#[derive(Serialize)]
struct EmbedWire<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedRow>,
}

#[derive(Deserialize)]
struct EmbedRow {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct CompleteWire<'a> {
    model: &'a str,
    instructions: &'a str,
    facts: &'a str,
    language: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompleteResponse {
    text: String,
}

impl RemoteCapability {
    /// Client for the given gateway. `base_url` is like
    /// `http://localhost:8080` (no trailing slash); `dim` must match what
    /// the embedding model actually emits.
    pub fn new(
        base_url: &str,
        model: &str,
        dim: usize,
        timeout: Duration,
    ) -> Result<Self, CapabilityError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CapabilityError::Unavailable(format!("build http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dim,
            timeout,
        })
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, CapabilityError>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "capability request");
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CapabilityError::RateLimited);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CapabilityError::Unavailable(format!(
                "{url} returned {status}: {body}"
            )));
        }
        resp.json::<R>()
            .await
            .map_err(|e| CapabilityError::Unavailable(format!("decode {url}: {e}")))
    }

    fn map_transport(&self, e: reqwest::Error) -> CapabilityError {
        if e.is_timeout() {
            CapabilityError::Timeout(self.timeout)
        } else {
            CapabilityError::Unavailable(e.to_string())
        }
    }
}

#[async_trait]
impl LanguageCapability for RemoteCapability {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, CapabilityError> {
        let vectors = self.embed_batch(std::slice::from_ref(&text.to_string())).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| CapabilityError::Unavailable("empty embedding response".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CapabilityError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let response: EmbedResponse = self
            .post("/v1/embeddings", &EmbedWire { model: &self.model, input: texts })
            .await?;
        if response.data.len() != texts.len() {
            return Err(CapabilityError::Unavailable(format!(
                "embedding response has {} rows for {} inputs",
                response.data.len(),
                texts.len()
            )));
        }
        let mut vectors = Vec::with_capacity(response.data.len());
        for row in response.data {
            if row.embedding.len() != self.dim {
                return Err(CapabilityError::Unavailable(format!(
                    "embedding has {} lanes, expected {}",
                    row.embedding.len(),
                    self.dim
                )));
            }
            let mut vector = row.embedding;
            // Gateways do not all normalize; cosine math requires it.
            normalize(&mut vector);
            vectors.push(vector);
        }
        Ok(vectors)
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CapabilityError> {
        let response: CompleteResponse = self
            .post(
                "/v1/complete",
                &CompleteWire {
                    model: &self.model,
                    instructions: &request.instructions,
                    facts: &request.facts,
                    language: request.language.as_str(),
                    max_tokens: request.max_tokens,
                    temperature: request.temperature,
                },
            )
            .await?;
        Ok(response.text)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
