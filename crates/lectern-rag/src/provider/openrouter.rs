//! OpenRouter chat and OCR client built on reqwest.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use derive_builder::Builder;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::chat::{ChatMessage, ChatProvider, ChatRequest, Role};
use super::ocr::{DOCUMENT_OCR_PROMPT, OcrProvider, PageText, parse_page_reply, repair_prompt};
use crate::{Error, Result};

/// Tracing target for OpenRouter client operations.
pub const TRACING_TARGET: &str = "lectern_rag::openrouter";

/// Provider name used in errors and logs.
const PROVIDER_NAME: &str = "openrouter";

/// Upper bound on the error body kept from a failed response.
const ERROR_BODY_CHARS: usize = 512;

/// Default values for configuration options.
mod defaults {
    /// OpenRouter API base URL.
    pub const BASE_URL: &str = "https://openrouter.ai/api/v1";

    /// Model used for answering questions.
    pub const CHAT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct:free";

    /// Model used for OCR and page repair.
    pub const OCR_MODEL: &str = "google/gemini-2.0-flash-lite-001";

    /// Request timeout in seconds.
    pub const REQUEST_TIMEOUT_SECS: u64 = 120;

    /// Maximum tokens for generated answers.
    pub const MAX_TOKENS: u32 = 1500;

    /// Sampling temperature for generated answers.
    pub const TEMPERATURE: f32 = 0.3;

    /// Value of the `X-Title` header.
    pub const TITLE: &str = "lectern";

    /// Value of the `User-Agent` header.
    pub const USER_AGENT: &str = concat!("lectern/", env!("CARGO_PKG_VERSION"));
}

/// Validates the [`OpenRouterConfig`] before building.
fn validate_config(builder: &OpenRouterConfigBuilder) -> std::result::Result<(), String> {
    match &builder.api_key {
        Some(key) if !key.trim().is_empty() => {}
        _ => return Err("OpenRouter API key must be set".to_owned()),
    }

    if let Some(base_url) = &builder.base_url
        && !base_url.starts_with("http://")
        && !base_url.starts_with("https://")
    {
        return Err(format!(
            "Base URL must start with http:// or https://, got {base_url}"
        ));
    }

    if let Some(temperature) = builder.temperature
        && !(0.0..=2.0).contains(&temperature)
    {
        return Err(format!(
            "Temperature must be between 0.0 and 2.0, got {temperature}"
        ));
    }

    if builder.max_tokens == Some(0) {
        return Err("Max tokens must be greater than 0".to_owned());
    }

    Ok(())
}

/// Configuration for [`OpenRouterClient`].
///
/// # Examples
///
/// ```rust
/// use lectern_rag::OpenRouterConfig;
///
/// let config = OpenRouterConfig::builder()
///     .with_api_key("sk-or-...")
///     .with_model("deepseek/deepseek-chat-v3-0324:free")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.max_tokens(), 1500);
/// ```
#[derive(Clone, Builder)]
#[builder(
    pattern = "owned",
    setter(into, prefix = "with"),
    build_fn(validate = "validate_config")
)]
pub struct OpenRouterConfig {
    /// API key sent as a bearer token.
    api_key: String,

    /// Base URL of the OpenAI-compatible API.
    #[builder(default = "defaults::BASE_URL.to_owned()")]
    base_url: String,

    /// Model used for answering questions.
    #[builder(default = "defaults::CHAT_MODEL.to_owned()")]
    model: String,

    /// Model used for OCR and page repair.
    #[builder(default = "defaults::OCR_MODEL.to_owned()")]
    ocr_model: String,

    /// Timeout for a single request.
    #[builder(default = "Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS)")]
    request_timeout: Duration,

    /// Token limit when the request does not set one.
    #[builder(default = "defaults::MAX_TOKENS")]
    max_tokens: u32,

    /// Temperature when the request does not set one.
    #[builder(default = "defaults::TEMPERATURE")]
    temperature: f32,

    /// `HTTP-Referer` header identifying the calling application.
    #[builder(default, setter(strip_option))]
    http_referer: Option<String>,

    /// `X-Title` header identifying the calling application.
    #[builder(default = "defaults::TITLE.to_owned()")]
    x_title: String,
}

impl OpenRouterConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> OpenRouterConfigBuilder {
        OpenRouterConfigBuilder::default()
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the chat model.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the OCR model.
    pub fn ocr_model(&self) -> &str {
        &self.ocr_model
    }

    /// Returns the request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the default token limit.
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Returns the default temperature.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Returns the `HTTP-Referer` header value, if any.
    pub fn http_referer(&self) -> Option<&str> {
        self.http_referer.as_deref()
    }

    /// Returns the `X-Title` header value.
    pub fn x_title(&self) -> &str {
        &self.x_title
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for OpenRouterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("ocr_model", &self.ocr_model)
            .field("request_timeout", &self.request_timeout)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("http_referer", &self.http_referer)
            .field("x_title", &self.x_title)
            .finish_non_exhaustive()
    }
}

/// Request body of `/chat/completions`.
#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: WireContent<'a>,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        Self {
            role: message.role,
            content: WireContent::Text(&message.content),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireContent<'a> {
    Text(&'a str),
    Parts(Vec<WirePart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WirePart<'a> {
    Text { text: &'a str },
    File { file: WireFile },
}

#[derive(Debug, Serialize)]
struct WireFile {
    filename: String,
    file_data: String,
}

/// Response body of `/chat/completions`.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionResponse {
    fn into_text(self) -> Option<String> {
        self.choices.into_iter().next()?.message.content
    }
}

/// Inner client that holds the HTTP client and configuration.
struct OpenRouterClientInner {
    http: Client,
    config: OpenRouterConfig,
}

/// Client for OpenRouter's OpenAI-compatible chat-completions API.
///
/// Answers questions as a [`ChatProvider`] and reads or repairs documents as
/// an [`OcrProvider`] using a separate, vision-capable model.
#[derive(Clone)]
pub struct OpenRouterClient {
    inner: Arc<OpenRouterClientInner>,
}

impl OpenRouterClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenRouterConfig) -> Result<Self> {
        tracing::debug!(
            target: TRACING_TARGET,
            base_url = config.base_url(),
            model = config.model(),
            ocr_model = config.ocr_model(),
            timeout_ms = config.request_timeout().as_millis(),
            "Creating OpenRouter client"
        );

        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(defaults::USER_AGENT)
            .build()
            .map_err(|e| Error::config(format!("failed to build http client: {e}")))?;

        let inner = OpenRouterClientInner { http, config };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &OpenRouterConfig {
        &self.inner.config
    }

    /// Posts a completion request and returns the first choice's text.
    async fn send(&self, body: &CompletionBody<'_>) -> Result<String> {
        let config = &self.inner.config;
        let mut request = self
            .inner
            .http
            .post(config.completions_url())
            .bearer_auth(&config.api_key)
            .header("X-Title", &config.x_title)
            .json(body);

        if let Some(referer) = config.http_referer() {
            request = request.header("HTTP-Referer", referer);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            let message: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(ERROR_BODY_CHARS)
                .collect();

            tracing::warn!(
                target: TRACING_TARGET,
                status = status.as_u16(),
                model = body.model,
                "OpenRouter request failed"
            );

            return Err(Error::provider(
                PROVIDER_NAME,
                format!("HTTP {}: {message}", status.as_u16()),
            ));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("invalid response: {e}")))?;

        parsed
            .into_text()
            .ok_or_else(|| Error::provider(PROVIDER_NAME, "response contained no message"))
    }
}

impl std::fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl ChatProvider for OpenRouterClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let config = &self.inner.config;
        let body = CompletionBody {
            model: config.model(),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            max_tokens: Some(request.max_tokens.unwrap_or(config.max_tokens)),
            temperature: Some(request.temperature.unwrap_or(config.temperature)),
        };

        tracing::debug!(
            target: TRACING_TARGET,
            model = body.model,
            messages = body.messages.len(),
            "Requesting chat completion"
        );

        self.send(&body).await
    }
}

#[async_trait::async_trait]
impl OcrProvider for OpenRouterClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn ocr_document(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::ocr(format!("failed to read {}: {e}", path.display())))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_owned());
        let file_data = format!(
            "data:application/pdf;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&bytes)
        );

        tracing::debug!(
            target: TRACING_TARGET,
            model = self.config().ocr_model(),
            bytes = bytes.len(),
            "Requesting whole-document OCR"
        );

        let body = CompletionBody {
            model: self.config().ocr_model(),
            messages: vec![WireMessage {
                role: Role::User,
                content: WireContent::Parts(vec![
                    WirePart::Text {
                        text: DOCUMENT_OCR_PROMPT,
                    },
                    WirePart::File {
                        file: WireFile {
                            filename,
                            file_data,
                        },
                    },
                ]),
            }],
            max_tokens: None,
            temperature: None,
        };

        self.send(&body).await.map_err(Error::ocr)
    }

    async fn repair_pages(&self, pages: &[PageText]) -> Result<Vec<PageText>> {
        let prompt = repair_prompt(pages);
        let body = CompletionBody {
            model: self.config().ocr_model(),
            messages: vec![WireMessage {
                role: Role::User,
                content: WireContent::Text(&prompt),
            }],
            max_tokens: None,
            temperature: None,
        };

        let reply = self.send(&body).await.map_err(Error::ocr)?;
        Ok(parse_page_reply(&reply))
    }
}
