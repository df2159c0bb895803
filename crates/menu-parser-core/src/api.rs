use std::path::Path;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ProviderConfig;
use crate::error::{MenuError, Result};
use crate::menu::{self, Menu};
use crate::prompt::{build_prompt, SYSTEM_PROMPT};

/// Client for one configured backend. Holds no per-call state, so the same
/// parser can serve any number of independent [`MenuParser::parse_menu`] calls.
pub struct MenuParser {
    config: ProviderConfig,
    http: Client,
}

impl MenuParser {
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Use a caller-supplied HTTP client (proxy, custom TLS, timeouts).
    pub fn with_client(config: ProviderConfig, http: Client) -> Self {
        Self { config, http }
    }

    /// Ask the backend to structure `raw_text` as a [`Menu`].
    ///
    /// Returns `Ok(None)` when the service withholds an answer (content
    /// filter or refusal). Every other failure is returned as an error,
    /// and nothing is retried.
    pub async fn parse_menu(&self, raw_text: &str) -> Result<Option<Menu>> {
        let prompt = build_prompt(raw_text);
        let url = self.config.completions_url();
        let (auth_name, auth_value) = self.config.auth_header();

        tracing::debug!(
            provider = %self.config.host(),
            model = self.config.model(),
            %url,
            "requesting structured menu"
        );

        let resp = self
            .http
            .post(&url)
            .header(auth_name, auth_value)
            .json(&request_body(&self.config, &prompt))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(MenuError::Api { status, body });
        }

        let body: Value = resp.json().await?;
        interpret_response(&body, &prompt)
    }

    /// Parse `raw_text`, hand the menu to `show`, then write it to `save_to`.
    ///
    /// When the service withholds an answer neither `show` nor the write
    /// happens and `Ok(None)` comes back.
    pub async fn run<F>(
        &self,
        raw_text: &str,
        save_to: Option<&Path>,
        show: F,
    ) -> Result<Option<Menu>>
    where
        F: FnOnce(&Menu) -> Result<()>,
    {
        let Some(parsed) = self.parse_menu(raw_text).await? else {
            return Ok(None);
        };
        show(&parsed)?;
        if let Some(path) = save_to {
            menu::persist(&parsed, path)?;
        }
        Ok(Some(parsed))
    }
}

/// Chat-completions body: system + user messages, temperature 0 and the
/// strict menu schema as `response_format`.
pub fn request_body(config: &ProviderConfig, prompt: &str) -> Value {
    json!({
        "model": config.model(),
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "user", "content": prompt}
        ],
        "temperature": 0,
        "response_format": {
            "type": "json_schema",
            "json_schema": {
                "name": menu::SCHEMA_NAME,
                "schema": menu::schema(),
                "strict": true
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    finish_reason: Option<String>,
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    refusal: Option<String>,
}

/// Turn a decoded chat-completions response into the parse outcome.
/// `prompt` is only used for logging a rejection.
pub fn interpret_response(body: &Value, prompt: &str) -> Result<Option<Menu>> {
    let resp = CompletionResponse::deserialize(body)
        .map_err(|e| MenuError::Malformed(format!("unexpected response shape: {e}")))?;
    let choice = resp.choices.into_iter().next().ok_or(MenuError::NoChoices)?;

    match choice.finish_reason.as_deref() {
        Some("content_filter") => {
            tracing::warn!(
                reason = "content_filter",
                %prompt,
                "completion blocked by content filter"
            );
            return Ok(None);
        }
        Some("length") => return Err(MenuError::Truncated),
        _ => {}
    }

    if let Some(refusal) = choice.message.refusal.filter(|r| !r.is_empty()) {
        tracing::warn!(reason = %refusal, %prompt, "model refused to answer");
        return Ok(None);
    }

    let content = choice
        .message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or(MenuError::EmptyContent)?;

    let menu: Menu =
        serde_json::from_str(&content).map_err(|e| MenuError::Malformed(e.to_string()))?;
    Ok(Some(menu))
}
