// Library root
// -----------
// This crate exposes the library surface for the `meritt` binary
// (`main.rs`), which parses arguments and hands off to `cli`.
//
// Module responsibilities:
// - `api`: HTTP calls to the Meritt API (login, env file lookup, download).
// - `cli`: argument definitions and dispatch.
// - `commands`: one handler per subcommand.
// - `config`: the `~/.meritt/config.json` file.
// - `credentials`: token pair storage in the OS keychain.
// - `env_file`: env file paths, backups and restores.
// - `project`: project name detection.
// - `secure_fs`: owner-only files for secrets.
// - `ui`: prompts, colored status lines, spinners and the interactive menu.
// - `update`: the crates.io version check.
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod env_file;
pub mod error;
pub mod logging;
pub mod project;
pub mod secure_fs;
pub mod ui;
pub mod update;

pub use error::{CliError, Result};
