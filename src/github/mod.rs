//! GitHub integration for creating issues as a GitHub App installation.
//!
//! This module provides:
//! - JWT generation for GitHub App authentication
//! - Installation lookup and installation access token exchange
//! - Issue submission on the configured repository

pub mod api_client;
pub mod error;
pub mod issues;
pub mod token_manager;

pub use api_client::GitHubClient;
pub use error::GitHubError;
pub use issues::{submit_issue, FieldError, IssueRequest, IssueResponse};
pub use token_manager::{generate_app_jwt, get_installation_id, get_installation_token};
