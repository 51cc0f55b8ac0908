//! OpenRouter provider options.

use std::time::Duration;

use anyhow::Context;
use clap::Args;
use lectern_rag::{OpenRouterClient, OpenRouterConfig};

use crate::TRACING_TARGET_CONFIG;

/// OpenRouter connection and model options.
#[derive(Clone, Args)]
pub struct OpenRouterArgs {
    /// OpenRouter API key.
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub openrouter_api_key: String,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, env = "OPENROUTER_BASE_URL")]
    pub openrouter_base_url: Option<String>,

    /// Model used to answer questions.
    #[arg(long, env = "OPENROUTER_MODEL")]
    pub openrouter_model: Option<String>,

    /// Vision-capable model used for OCR and page repair.
    #[arg(long, env = "OPENROUTER_OCR_MODEL")]
    pub openrouter_ocr_model: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, env = "OPENROUTER_TIMEOUT_SECS", default_value_t = 120)]
    pub openrouter_timeout_secs: u64,

    /// Value of the `HTTP-Referer` header.
    #[arg(long, env = "OPENROUTER_REFERER")]
    pub openrouter_referer: Option<String>,

    /// Value of the `X-Title` header.
    #[arg(long, env = "OPENROUTER_TITLE")]
    pub openrouter_title: Option<String>,
}

impl OpenRouterArgs {
    /// Builds the client configuration.
    pub fn to_config(&self) -> anyhow::Result<OpenRouterConfig> {
        let mut builder = OpenRouterConfig::builder()
            .with_api_key(self.openrouter_api_key.clone())
            .with_request_timeout(Duration::from_secs(self.openrouter_timeout_secs));

        if let Some(base_url) = &self.openrouter_base_url {
            builder = builder.with_base_url(base_url.clone());
        }
        if let Some(model) = &self.openrouter_model {
            builder = builder.with_model(model.clone());
        }
        if let Some(model) = &self.openrouter_ocr_model {
            builder = builder.with_ocr_model(model.clone());
        }
        if let Some(referer) = &self.openrouter_referer {
            builder = builder.with_http_referer(referer.clone());
        }
        if let Some(title) = &self.openrouter_title {
            builder = builder.with_x_title(title.clone());
        }

        builder.build().context("invalid OpenRouter configuration")
    }

    /// Creates the OpenRouter client.
    pub fn create_client(&self) -> anyhow::Result<OpenRouterClient> {
        let config = self.to_config()?;

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            base_url = config.base_url(),
            model = config.model(),
            ocr_model = config.ocr_model(),
            timeout_secs = config.request_timeout().as_secs(),
            "OpenRouter configuration"
        );

        OpenRouterClient::new(config).context("failed to create OpenRouter client")
    }
}

impl std::fmt::Debug for OpenRouterArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterArgs")
            .field("openrouter_base_url", &self.openrouter_base_url)
            .field("openrouter_model", &self.openrouter_model)
            .field("openrouter_ocr_model", &self.openrouter_ocr_model)
            .field("openrouter_timeout_secs", &self.openrouter_timeout_secs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(api_key: &str) -> OpenRouterArgs {
        OpenRouterArgs {
            openrouter_api_key: api_key.to_owned(),
            openrouter_base_url: None,
            openrouter_model: Some("deepseek/deepseek-chat-v3-0324:free".to_owned()),
            openrouter_ocr_model: None,
            openrouter_timeout_secs: 30,
            openrouter_referer: Some("http://localhost:5173".to_owned()),
            openrouter_title: None,
        }
    }

    #[test]
    fn builds_config_from_args() {
        let config = args("sk-or-test").to_config().unwrap();
        assert_eq!(config.model(), "deepseek/deepseek-chat-v3-0324:free");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.http_referer(), Some("http://localhost:5173"));
    }

    #[test]
    fn blank_key_is_a_configuration_error() {
        let error = args("").to_config().unwrap_err();
        assert!(format!("{error:#}").contains("API key"));
    }

    #[test]
    fn debug_output_hides_the_key() {
        assert!(!format!("{:?}", args("sk-or-secret")).contains("secret"));
    }
}
