// Error type shared by every module of the library. Messages are shown to
// the user as-is, so they name the command to run next where one exists.

use crate::constants::VALID_ENVIRONMENTS;
use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Config file not found at {}. Run `meritt install`.", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid environment '{}'. Allowed values: {}", .0, VALID_ENVIRONMENTS.join(", "))]
    InvalidEnvironment(String),

    #[error("Project name not found in package.json or Cargo.toml.")]
    ProjectNameMissing,

    #[error("You are not logged in. Run `meritt login` first.")]
    NotLoggedIn,

    #[error("Invalid credentials. Please try again.")]
    InvalidCredentials,

    #[error("Session rejected by the API ({0}). Run `meritt login` again.")]
    Unauthorized(StatusCode),

    #[error("Project not found, make sure project name is correct: {0}")]
    ProjectNotFound(String),

    #[error("API request failed with {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Credential store error: {0}")]
    Credentials(String),

    #[error("No backup found at {}.", .0.display())]
    NoBackup(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

impl CliError {
    /// Create a new invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a new invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Build an error from a non-success response that has no dedicated variant.
    pub fn api(status: StatusCode, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }
}
