//! Thin GitHub REST client shared by the authentication handshake and the
//! issue submitter.
//!
//! Every request carries the v3 media type and a bearer credential, which is
//! either an app JWT or an installation access token depending on the endpoint.

use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use super::error::GitHubError;

pub const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

const USER_AGENT: &str = concat!("issue-relay/", env!("CARGO_PKG_VERSION"));

/// Raw status and body of a GitHub response, for callers that interpret
/// non-2xx bodies themselves.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: bytes::Bytes,
}

/// GitHub API client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    api_base: String,
    client: reqwest::Client,
}

impl GitHubClient {
    /// Create a client whose requests fail after `timeout` instead of hanging.
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            api_base: api_base.into(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Send a request and return the raw status and body.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        bearer: &str,
        body: Option<&B>,
        context: &'static str,
    ) -> Result<RawResponse, GitHubError> {
        let mut request = self
            .client
            .request(method, self.url(path))
            .header("Authorization", format!("Bearer {}", bearer))
            .header("Accept", GITHUB_ACCEPT);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|source| GitHubError::Transport { context, source })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| GitHubError::Transport { context, source })?;

        tracing::debug!(%status, bytes = body.len(), "GitHub {} responded", context);

        Ok(RawResponse { status, body })
    }

    /// Make an authenticated GET request and decode a successful JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: &str,
        context: &'static str,
    ) -> Result<T, GitHubError> {
        let response = self
            .send::<()>(Method::GET, path, bearer, None, context)
            .await?;
        decode_success(response, context)
    }

    /// Make an authenticated POST request and decode a successful JSON response.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: &str,
        body: &B,
        context: &'static str,
    ) -> Result<T, GitHubError> {
        let response = self
            .send(Method::POST, path, bearer, Some(body), context)
            .await?;
        decode_success(response, context)
    }
}

fn decode_success<T: DeserializeOwned>(
    response: RawResponse,
    context: &'static str,
) -> Result<T, GitHubError> {
    if !response.status.is_success() {
        return Err(GitHubError::Status {
            context,
            status: response.status,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        });
    }

    serde_json::from_slice(&response.body).map_err(|source| GitHubError::Decode { context, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Id {
        id: u64,
    }

    fn raw(status: u16, body: &'static str) -> RawResponse {
        RawResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body: bytes::Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn test_decode_success() {
        let id: Id = decode_success(raw(200, r#"{"id": 7, "extra": true}"#), "lookup").unwrap();
        assert_eq!(id.id, 7);
    }

    #[test]
    fn test_decode_rejects_error_status() {
        let err = decode_success::<Id>(raw(404, r#"{"message":"Not Found"}"#), "lookup")
            .unwrap_err();
        match err {
            GitHubError::Status { status, body, .. } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert!(body.contains("Not Found"));
            }
            other => panic!("Expected status error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_missing_field() {
        let err = decode_success::<Id>(raw(200, r#"{"name":"x"}"#), "lookup").unwrap_err();
        assert!(matches!(err, GitHubError::Decode { .. }));
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let client = GitHubClient::new("http://localhost:1", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("/app"), "http://localhost:1/app");
    }
}
