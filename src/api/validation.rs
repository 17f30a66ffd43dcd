//! Request gate for inbound issue submissions.
//!
//! Checks run in a fixed order and the first failure wins: body shape,
//! shared-secret token, channel, then title.

use subtle::ConstantTimeEq;
use url::form_urlencoded;

use super::error::ValidationError;
use crate::github::IssueRequest;

/// Query parameters of an inbound submission
#[derive(Debug, Default, PartialEq)]
pub struct GateParams {
    pub token: Option<String>,
    pub channel: Option<String>,
}

impl GateParams {
    /// Read `token` and `channel` from a raw query string. When a key repeats,
    /// the first occurrence wins; unknown keys are ignored.
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = GateParams::default();
        let Some(query) = query else {
            return params;
        };

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "token" => &mut params.token,
                "channel" => &mut params.channel,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        params
    }
}

/// A request that passed the gate, carried through the rest of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedRequest {
    pub issue: IssueRequest,
    pub channel: String,
}

/// Validate an inbound request against the configured shared secret.
pub fn validate_request(
    body: &[u8],
    params: &GateParams,
    api_token: &str,
) -> Result<AcceptedRequest, ValidationError> {
    let issue: IssueRequest = serde_json::from_slice(body)?;

    let provided = params.token.as_deref().unwrap_or_default();
    if !token_matches(api_token, provided) {
        return Err(ValidationError::TokenMismatch);
    }

    let channel = match params.channel.as_deref() {
        Some(channel) if !channel.is_empty() => channel.to_string(),
        _ => return Err(ValidationError::MissingChannel),
    };

    if issue.title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }

    Ok(AcceptedRequest { issue, channel })
}

/// Compare tokens in constant time
fn token_matches(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();

    !expected.is_empty()
        && expected.len() == provided.len()
        && expected.ct_eq(provided).into()
}
