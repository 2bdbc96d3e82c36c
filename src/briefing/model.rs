// src/briefing/model.rs
//! Text-generation client used by the briefing job: provider abstraction, the
//! Gemini HTTP provider and a scripted mock for tests/local runs.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Accepted API key variables, in lookup order.
pub const API_KEY_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// HTTP 429 or an equivalent quota signal; the only retryable failure.
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("api error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("request failed: {0}")]
    Request(String),
    #[error("empty response")]
    Empty,
}

impl ModelError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ModelError::RateLimited(_))
    }
}

#[async_trait]
pub trait BriefingModel: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, ModelError>;
    /// Model identifier recorded in the briefing header.
    fn name(&self) -> &str;
}

/// Read the API key from the environment. Missing key is a hard error.
pub fn api_key_from_env() -> anyhow::Result<String> {
    API_KEY_VARS
        .iter()
        .find_map(|k| std::env::var(k).ok().filter(|v| !v.trim().is_empty()))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Set {} or {} environment variable",
                API_KEY_VARS[0],
                API_KEY_VARS[1]
            )
        })
}

/// Gemini `generateContent` provider.
pub struct GeminiModel {
    http: reqwest::Client,
    api_key: String,
    model: String,
    max_output_tokens: u32,
    endpoint: String,
}

impl GeminiModel {
    pub fn new(api_key: String, model: &str, max_output_tokens: u32) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("molt-street-journal/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            api_key,
            model: model.to_string(),
            max_output_tokens,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        })
    }

    pub fn from_env(model: &str, max_output_tokens: u32) -> anyhow::Result<Self> {
        Self::new(api_key_from_env()?, model, max_output_tokens)
    }

    /// Point at a different base URL (proxies, local fakes).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateReq<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<PartReq<'a>>,
}

#[derive(Serialize)]
struct PartReq<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResp {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartResp>,
}

#[derive(Deserialize)]
struct PartResp {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl BriefingModel for GeminiModel {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, ModelError> {
        let req = GenerateReq {
            system_instruction: Content {
                role: None,
                parts: vec![PartReq { text: system }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![PartReq { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.max_output_tokens,
            },
        };

        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelError::RateLimited(sanitize(&body)));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                body: sanitize(&body),
            });
        }

        let body: GenerateResp = resp
            .json()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(ModelError::Empty);
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Replays a fixed script of responses, one per call; records prompts.
pub struct MockModel {
    script: Mutex<VecDeque<Result<String, ModelError>>>,
    calls: Mutex<Vec<String>>,
}

impl MockModel {
    pub fn new(script: Vec<Result<String, ModelError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl BriefingModel for MockModel {
    async fn generate(&self, _system: &str, prompt: &str) -> Result<String, ModelError> {
        if let Ok(mut c) = self.calls.lock() {
            c.push(prompt.to_string());
        }
        self.script
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .unwrap_or(Err(ModelError::Empty))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Single line, bounded length; keeps error bodies readable in logs.
fn sanitize(input: &str) -> String {
    let one_line: String = input.split_whitespace().collect::<Vec<_>>().join(" ");
    one_line.chars().take(300).collect()
}
