//! Token management for GitHub App authentication.
//!
//! GitHub Apps use two types of authentication:
//! 1. App JWT - Short-lived JWT signed with the app's private key (for app-level operations)
//! 2. Installation Access Token - Token for a specific installation (for repo operations)
//!
//! Nothing here is cached: every call mints its own JWT and every issue
//! submission exchanges it for its own installation token.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use super::api_client::GitHubClient;
use super::error::GitHubError;
use crate::config::Environment;

/// Lifetime of an app JWT.
pub const APP_JWT_TTL_SECS: i64 = 60;

/// JWT claims for GitHub App authentication.
#[derive(Debug, Serialize, Deserialize)]
pub struct GitHubAppClaims {
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp), always `iat + 60`
    pub exp: i64,
    /// Issuer - the GitHub App ID
    pub iss: String,
    /// Unique per JWT so two minted in the same second differ
    pub jti: String,
}

/// Generate a JWT for GitHub App authentication.
///
/// The JWT is signed with RS256 (RSA-SHA256) using the app's private key and
/// is valid for 60 seconds.
///
/// # Arguments
/// * `app_id` - The GitHub App ID
/// * `private_key_pem` - The private key in PEM format
///
/// # Example
/// ```ignore
/// let jwt = generate_app_jwt("12345", private_key.as_bytes())?;
/// // Use: Authorization: Bearer {jwt}
/// ```
pub fn generate_app_jwt(app_id: &str, private_key_pem: &[u8]) -> Result<String, GitHubError> {
    let iat = Utc::now();
    let exp = iat + Duration::seconds(APP_JWT_TTL_SECS);

    let claims = GitHubAppClaims {
        iat: iat.timestamp(),
        exp: exp.timestamp(),
        iss: app_id.to_string(),
        jti: uuid::Uuid::new_v4().to_string(),
    };

    let encoding_key = EncodingKey::from_rsa_pem(private_key_pem)?;
    let token = encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)?;

    Ok(token)
}

#[derive(Debug, Deserialize)]
struct InstallationResponse {
    id: u64,
}

/// Look up the installation of the app on the configured repository.
pub async fn get_installation_id(
    client: &GitHubClient,
    env: &Environment,
) -> Result<u64, GitHubError> {
    let jwt = generate_app_jwt(&env.app_identifier, &env.app_private_key)?;
    let path = format!("/repos/{}/{}/installation", env.repo_owner, env.repo_name);

    let installation: InstallationResponse = client
        .get(&path, &jwt, "look up app installation")
        .await?;

    tracing::debug!(
        installation_id = installation.id,
        "Resolved installation for {}/{}",
        env.repo_owner,
        env.repo_name
    );

    Ok(installation.id)
}

/// Response from GitHub's installation access token endpoint.
#[derive(Debug, Deserialize)]
pub struct InstallationTokenResponse {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct AccessTokenRequest<'a> {
    repositories: [&'a str; 1],
}

/// Get an installation access token scoped to the configured repository.
///
/// Resolves the installation first, then exchanges a fresh app JWT for a
/// token. The JWT authenticates the exchange; the token is the product.
pub async fn get_installation_token(
    client: &GitHubClient,
    env: &Environment,
) -> Result<InstallationTokenResponse, GitHubError> {
    let installation_id = get_installation_id(client, env).await?;

    let jwt = generate_app_jwt(&env.app_identifier, &env.app_private_key)?;
    let path = format!("/app/installations/{}/access_tokens", installation_id);
    let body = AccessTokenRequest {
        repositories: [env.repo_name.as_str()],
    };

    let token: InstallationTokenResponse = client
        .post(&path, &jwt, &body, "request installation access token")
        .await?;

    tracing::debug!(
        installation_id,
        expires_at = token.expires_at.as_deref().unwrap_or("unknown"),
        "Obtained installation access token"
    );

    Ok(token)
}
