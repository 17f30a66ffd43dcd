pub mod api;
pub mod config;
pub mod github;

use anyhow::{Context, Result};

use config::Environment;
use github::GitHubClient;

pub struct AppState {
    pub env: Environment,
    pub github: GitHubClient,
}

impl AppState {
    pub fn new(env: Environment) -> Result<Self> {
        let github = GitHubClient::new(env.api_base.clone(), env.request_timeout)
            .context("Failed to build GitHub HTTP client")?;

        Ok(Self { env, github })
    }
}
