use std::path::PathBuf;
use thiserror::Error;

/// Every way a generation run can fail.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Missing or invalid API key, bad env value, or malformed CLI input.
    #[error("{0}")]
    Configuration(String),

    /// The provider rejected the credentials.
    #[error("provider rejected the API key: {0}")]
    Authentication(String),

    /// The provider is throttling us.
    #[error("provider rate limit hit: {0}")]
    RateLimit(String),

    /// Any other provider failure, including transport errors (no status).
    #[error("{}", provider_message(*status, message))]
    Provider {
        status: Option<u16>,
        message: String,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn provider_message(status: Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("provider returned HTTP {}: {}", code, message),
        None => format!("provider request failed: {}", message),
    }
}

impl ScriptError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn provider(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Provider {
            status,
            message: message.into(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Kind name shown to the user on stderr.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "ConfigurationError",
            Self::Authentication(_) => "AuthenticationError",
            Self::RateLimit(_) => "RateLimitError",
            Self::Provider { .. } => "ProviderError",
            Self::Write { .. } => "WriteError",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 2,
            Self::Authentication(_) => 3,
            Self::RateLimit(_) => 4,
            Self::Provider { .. } => 5,
            Self::Write { .. } => 6,
        }
    }

    /// Errors after which further variations cannot succeed either.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Authentication(_))
    }
}
