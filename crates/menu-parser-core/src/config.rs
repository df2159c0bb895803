use std::str::FromStr;

use crate::error::{MenuError, Result};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
/// Ollama ignores the key, but the OpenAI-compatible route still expects one.
pub const OLLAMA_API_KEY: &str = "nokeyneeded";

/// Which backend `API_HOST` selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiHost {
    Azure,
    OpenAi,
    Ollama,
}

impl FromStr for ApiHost {
    type Err = MenuError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "azure" => Ok(Self::Azure),
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(MenuError::UnknownApiHost(other.to_string())),
        }
    }
}

impl std::fmt::Display for ApiHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Azure => write!(f, "azure"),
            Self::OpenAi => write!(f, "openai"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

/// Connection settings for one chat-completion backend.
///
/// Each variant carries only what its backend needs. Built once at startup
/// and passed by reference to [`crate::api::MenuParser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    /// Azure OpenAI deployment.
    Azure {
        endpoint: String,
        api_key: String,
        api_version: String,
        deployment: String,
    },
    /// api.openai.com with a personal key.
    OpenAi { api_key: String, model: String },
    /// Local Ollama server on the loopback interface.
    Ollama {
        base_url: String,
        api_key: String,
        model: String,
    },
}

impl ProviderConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or(MenuError::MissingVar(key))
        };

        let host: ApiHost = lookup("API_HOST")
            .filter(|v| !v.is_empty())
            .ok_or(MenuError::MissingApiHost)?
            .parse()?;

        Ok(match host {
            ApiHost::Azure => Self::Azure {
                endpoint: get("AZURE_OPENAI_ENDPOINT")?,
                api_key: get("AZURE_OPENAI_API_KEY")?,
                api_version: get("AZURE_OPENAI_API_VERSION")?,
                deployment: get("AZURE_OPENAI_DEPLOYMENT_NAME")?,
            },
            ApiHost::OpenAi => Self::OpenAi {
                api_key: get("OPENAI_KEY")?,
                model: get("OPENAI_MODEL")?,
            },
            ApiHost::Ollama => Self::Ollama {
                base_url: OLLAMA_BASE_URL.to_string(),
                api_key: OLLAMA_API_KEY.to_string(),
                model: get("OLLAMA_MODEL")?,
            },
        })
    }

    pub fn host(&self) -> ApiHost {
        match self {
            Self::Azure { .. } => ApiHost::Azure,
            Self::OpenAi { .. } => ApiHost::OpenAi,
            Self::Ollama { .. } => ApiHost::Ollama,
        }
    }

    /// Value sent as `model` in the request body. For Azure this is the
    /// deployment name.
    pub fn model(&self) -> &str {
        match self {
            Self::Azure { deployment, .. } => deployment,
            Self::OpenAi { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Full chat-completions URL for this backend.
    pub fn completions_url(&self) -> String {
        match self {
            Self::Azure {
                endpoint,
                api_version,
                deployment,
                ..
            } => format!(
                "{}/openai/deployments/{deployment}/chat/completions?api-version={api_version}",
                endpoint.trim_end_matches('/'),
            ),
            Self::OpenAi { .. } => format!("{OPENAI_BASE_URL}/chat/completions"),
            Self::Ollama { base_url, .. } => {
                format!("{}/chat/completions", base_url.trim_end_matches('/'))
            }
        }
    }

    /// Header name and value carrying the credential.
    pub fn auth_header(&self) -> (&'static str, String) {
        match self {
            Self::Azure { api_key, .. } => ("api-key", api_key.clone()),
            Self::OpenAi { api_key, .. } | Self::Ollama { api_key, .. } => {
                ("Authorization", format!("Bearer {api_key}"))
            }
        }
    }
}
