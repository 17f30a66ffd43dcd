use thiserror::Error;

/// Errors raised while talking to GitHub as an app installation.
#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("Failed to sign app JWT: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Failed to {context}: {source}")]
    Transport {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("GitHub API error during {context}: {status} - {body}")]
    Status {
        context: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse {context} response: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl GitHubError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GitHubError::Transport { source, .. } if source.is_timeout())
    }
}
