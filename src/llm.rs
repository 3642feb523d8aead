//! Chat completion clients for OpenAI-compatible services.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{Result, TripmateError};
use crate::message::{ChatRequest, Message};

/// Returned by [`LanguageModel::generate`] whenever the call fails.
pub const GENERATE_FAILURE: &str = "错误:调用语言模型服务时出错。";

/// Minimal abstraction around a chat completion provider.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Sends the messages as one non-streaming request and returns the first choice's text.
    async fn complete_chat(&self, messages: &[Message]) -> Result<String>;

    async fn complete(&self, prompt: &str, system_prompt: &str) -> Result<String> {
        let messages = ChatRequest::new(prompt, system_prompt).into_messages();
        self.complete_chat(&messages).await
    }

    /// Like [`LanguageModel::complete`], but any failure becomes [`GENERATE_FAILURE`].
    async fn generate(&self, prompt: &str, system_prompt: &str) -> String {
        info!("calling language model");
        match self.complete(prompt, system_prompt).await {
            Ok(answer) => {
                info!("language model responded");
                answer
            }
            Err(err) => {
                warn!(error = %err, kind = ?err.kind(), "language model call failed");
                GENERATE_FAILURE.to_string()
            }
        }
    }
}

fn coalesce_error(status: reqwest::StatusCode, body: &str, provider: &str) -> TripmateError {
    match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            TripmateError::Auth {
                provider: provider.to_string(),
                status: status.as_u16(),
                body: body.to_string(),
            }
        }
        reqwest::StatusCode::TOO_MANY_REQUESTS => {
            TripmateError::LanguageModel(format!("{provider} rate limit exceeded: {body}"))
        }
        _ => TripmateError::LanguageModel(format!("{provider} request failed with {status}: {body}")),
    }
}

/// Client for any service speaking the OpenAI chat-completions protocol.
#[derive(Clone)]
pub struct OpenAICompatibleClient {
    http: reqwest::Client,
    model: String,
    endpoint: String,
}

impl OpenAICompatibleClient {
    /// Builds the HTTP transport with the bearer credential installed as a default header.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.model.trim().is_empty() {
            return Err(TripmateError::Config("model name must not be empty".into()));
        }
        if config.api_key.trim().is_empty() {
            return Err(TripmateError::Config("api key must not be empty".into()));
        }
        if config.base_url.trim().is_empty() {
            return Err(TripmateError::Config("base url must not be empty".into()));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|err| TripmateError::Config(format!("api key is not a valid header: {err}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| TripmateError::Config(format!("http client error: {err}")))?;

        info!(model = %config.model, base_url = %config.base_url, "initialized chat client");

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LanguageModel for OpenAICompatibleClient {
    async fn complete_chat(&self, messages: &[Message]) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
        });

        debug!(endpoint = %self.endpoint, messages = messages.len(), "posting chat completion");
        let resp = self.http.post(&self.endpoint).json(&payload).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(coalesce_error(status, &body, "openai"));
        }

        let body: OpenAiResponse = resp
            .json()
            .await
            .map_err(|err| TripmateError::Parse(format!("chat completion body: {err}")))?;

        let first = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TripmateError::Parse("chat completion returned no choices".into()))?;

        first
            .message
            .content
            .ok_or_else(|| TripmateError::Parse("first choice has no message content".into()))
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(any(test, feature = "testing"))]
pub use stub::StubModel;

#[cfg(any(test, feature = "testing"))]
mod stub {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::LanguageModel;
    use crate::error::{Result, TripmateError};
    use crate::message::Message;

    /// A deterministic model used for tests and offline demos.
    ///
    /// Replies are consumed in order; every call records the messages it was given.
    pub struct StubModel {
        responses: Mutex<VecDeque<std::result::Result<String, String>>>,
        received: Mutex<Vec<Vec<Message>>>,
    }

    impl StubModel {
        pub fn new(responses: Vec<String>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().map(Ok).collect()),
                received: Mutex::new(Vec::new()),
            }
        }

        /// A model whose only reply is the given failure.
        pub fn failing(message: impl Into<String>) -> Self {
            Self {
                responses: Mutex::new(VecDeque::from([Err(message.into())])),
                received: Mutex::new(Vec::new()),
            }
        }

        pub fn received(&self) -> Vec<Vec<Message>> {
            self.received.lock().expect("stub model poisoned").clone()
        }
    }

    #[async_trait]
    impl LanguageModel for StubModel {
        async fn complete_chat(&self, messages: &[Message]) -> Result<String> {
            self.received
                .lock()
                .expect("stub model poisoned")
                .push(messages.to_vec());

            let next = self
                .responses
                .lock()
                .expect("stub model poisoned")
                .pop_front()
                .ok_or_else(|| {
                    TripmateError::LanguageModel("StubModel ran out of scripted responses".into())
                })?;
            next.map_err(TripmateError::LanguageModel)
        }
    }
}
