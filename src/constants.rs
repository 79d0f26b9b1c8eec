// Static values shared across the CLI: names used for the credential
// store, file locations and remote endpoints.

/// Binary name shown in messages and the help table.
pub const BIN_NAME: &str = "meritt";
/// Crate name as published on crates.io.
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
/// Current application version (from Cargo.toml).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name under which the token pair is stored.
pub const SERVICE_NAME: &str = "meritt-cli";
/// Account name under which the token pair is stored.
pub const ACCOUNT_NAME: &str = "auth-token";

/// Directory in the user's home holding the CLI's files.
pub const CONFIG_DIR_NAME: &str = ".meritt";
pub const CONFIG_FILE_NAME: &str = "config.json";
/// Fallback credential file used when no OS keychain is reachable.
pub const CREDENTIALS_FILE_NAME: &str = "credentials.json";

/// Overrides the `apiUrl` stored in the config file.
pub const API_URL_ENV: &str = "MERITT_API_URL";

pub const DOCS_URL: &str = "https://docs.meritt.dev/cli";
pub const CRATES_IO_API: &str = "https://crates.io/api/v1";

pub const LOGIN_PATH: &str = "/cli/auth/login";
pub const ENV_PATH: &str = "/cli/env";

/// Environments the API serves env files for.
pub const VALID_ENVIRONMENTS: [&str; 3] = ["development", "staging", "production"];

pub const BACKUP_SUFFIX: &str = ".backup";
/// File restored by `recover` when no environment is given.
pub const DEFAULT_ENV_FILE: &str = ".env";

pub const UPDATE_CMD: &str = "cargo install meritt-cli --force";
