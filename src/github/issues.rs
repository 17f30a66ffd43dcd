//! Issue creation on the configured repository.

use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};

use super::api_client::{GitHubClient, RawResponse};
use super::error::GitHubError;
use super::token_manager::get_installation_token;
use crate::config::Environment;

/// Prefix of the label recording where an issue came from.
pub const CHANNEL_LABEL_PREFIX: &str = "From-";

/// An issue to open, in GitHub's create-issue JSON shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueRequest {
    /// Missing titles decode as empty and are rejected by the request gate
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub assignees: Vec<String>,
    /// Milestone 0 does not exist on GitHub and is treated as unset
    #[serde(default, skip_serializing_if = "milestone_unset")]
    pub milestone: Option<u64>,
    /// GitHub accepts label names or label objects, so entries stay opaque
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub labels: Vec<serde_json::Value>,
}

/// Decode an explicit `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn milestone_unset(milestone: &Option<u64>) -> bool {
    matches!(milestone, None | Some(0))
}

impl IssueRequest {
    /// Tag the issue with `From-<channel>`, leaving exactly one copy of that
    /// label at the end of the list.
    pub fn add_channel_label(&mut self, channel: &str) {
        let label = format!("{}{}", CHANNEL_LABEL_PREFIX, channel);
        self.labels
            .retain(|existing| existing.as_str() != Some(label.as_str()));
        self.labels.push(serde_json::Value::String(label));
    }
}

/// A field-level validation failure reported by GitHub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcome of an issue submission as returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IssueResponse {
    Created {
        number: u64,
    },
    Failed {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        errors: Option<Vec<FieldError>>,
    },
}

impl IssueResponse {
    pub fn failed(message: impl Into<String>) -> Self {
        IssueResponse::Failed {
            message: message.into(),
            errors: None,
        }
    }

    pub fn number(&self) -> Option<u64> {
        match self {
            IssueResponse::Created { number } => Some(*number),
            IssueResponse::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    number: u64,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
    #[serde(default)]
    errors: Option<Vec<FieldError>>,
}

/// Create the issue on the configured repository.
///
/// Authenticates from scratch (app JWT, installation lookup, access token)
/// and never fails outright: every failure is logged and folded into
/// [`IssueResponse::Failed`] naming the step that broke.
pub async fn submit_issue(
    client: &GitHubClient,
    env: &Environment,
    mut request: IssueRequest,
    channel: &str,
) -> IssueResponse {
    let token = match get_installation_token(client, env).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, repo = %env.repo_name, "Failed to obtain installation token");
            return IssueResponse::failed(failure_message("get installation token", &e));
        }
    };

    request.add_channel_label(channel);

    let path = format!("/repos/{}/{}/issues", env.repo_owner, env.repo_name);
    let response = match client
        .send(
            Method::POST,
            &path,
            &token.token,
            Some(&request),
            "create issue",
        )
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, title = %request.title, "Failed to send issue to GitHub");
            return IssueResponse::failed(failure_message("create issue", &e));
        }
    };

    let result = parse_issue_response(response);
    match &result {
        IssueResponse::Created { number } => {
            tracing::info!(number, channel, "Created issue in {}/{}", env.repo_owner, env.repo_name);
        }
        IssueResponse::Failed { message, .. } => {
            tracing::warn!(%message, channel, "GitHub rejected issue");
        }
    }
    result
}

fn failure_message(step: &str, err: &GitHubError) -> String {
    if err.is_timeout() {
        format!("Failed to {}: request to GitHub timed out", step)
    } else {
        format!("Failed to {}: {}", step, err)
    }
}

fn parse_issue_response(response: RawResponse) -> IssueResponse {
    if response.status.is_success() {
        return match serde_json::from_slice::<CreatedIssue>(&response.body) {
            Ok(created) => IssueResponse::Created {
                number: created.number,
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to parse created issue response");
                IssueResponse::failed(format!("Failed to parse create issue response: {}", e))
            }
        };
    }

    match serde_json::from_slice::<GitHubErrorBody>(&response.body) {
        Ok(body) => IssueResponse::Failed {
            message: body.message,
            errors: body.errors,
        },
        Err(e) => {
            tracing::error!(error = %e, status = %response.status, "Failed to parse GitHub error response");
            IssueResponse::failed(format!(
                "GitHub API error during create issue: {}",
                response.status
            ))
        }
    }
}
