#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    #[error("API_HOST is not set (expected one of: azure, openai, ollama)")]
    MissingApiHost,

    #[error("unknown API_HOST {0:?} (expected one of: azure, openai, ollama)")]
    UnknownApiHost(String),

    #[error("missing environment variable: {0}")]
    MissingVar(&'static str),

    #[cfg(feature = "network")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("completion returned no choices")]
    NoChoices,

    #[error("completion was cut off before the structured output finished")]
    Truncated,

    #[error("completion returned no content")]
    EmptyContent,

    #[error("structured output does not match the menu schema: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl MenuError {
    /// True for errors raised while reading provider configuration,
    /// before any request is sent.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::MissingApiHost | Self::UnknownApiHost(_) | Self::MissingVar(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MenuError>;
