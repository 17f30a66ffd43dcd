use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    Json,
};
use std::sync::Arc;

use super::error::ValidationError;
use super::validation::{validate_request, GateParams};
use crate::github::{submit_issue, IssueResponse};
use crate::AppState;

/// Create a GitHub issue on behalf of the caller.
///
/// ANY /?token=<secret>&channel=<channel>
///
/// Rejected requests get a bare 400. Past the gate the status is always 200
/// and the body says whether GitHub accepted the issue.
pub async fn create_issue(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Json<IssueResponse>, ValidationError> {
    let params = GateParams::from_query(query.as_deref());
    let accepted = validate_request(&body, &params, &state.env.api_token).map_err(|e| {
        tracing::warn!(reason = e.as_str(), error = %e, "Rejected issue request");
        e
    })?;

    tracing::info!(
        channel = %accepted.channel,
        title = %accepted.issue.title,
        "Accepted issue request"
    );

    let response = submit_issue(&state.github, &state.env, accepted.issue, &accepted.channel).await;
    Ok(Json(response))
}
