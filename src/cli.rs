// Command line argument definitions and dispatch to `commands`.

use crate::commands::{self, Context, FetchEnvArgs, RecoverArgs};
use crate::config::Config;
use crate::error::Result;
use crate::ui::TerminalPrompter;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Meritt CLI - log in and fetch project env files
#[derive(Parser, Debug)]
#[command(name = "meritt", version, about, disable_help_subcommand = true)]
pub struct Args {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config.json (defaults to ~/.meritt/config.json)
    #[arg(long, global = true, env = "MERITT_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Set up the Meritt CLI configuration file
    Install,

    /// Log in to your Meritt account
    Login,

    /// Fetch and create a .env file for the current project and specified environment
    #[command(alias = "env")]
    FetchEnv {
        /// development, staging or production (prompted for when omitted)
        environment: Option<String>,

        /// Custom path to save the .env file
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Project name to use instead of the one in package.json/Cargo.toml
        #[arg(long)]
        project: Option<String>,
    },

    /// Log out of your Meritt account
    Logout,

    /// Display help information
    Help,

    /// Open the Meritt CLI documentation in your browser
    Docs,

    /// Restore the .env file from backup
    Recover {
        /// Restore .env.<environment> instead of .env
        environment: Option<String>,

        /// Restore this file instead
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Start the CLI in interactive mode
    Interactive,

    /// Check for updates to the Meritt CLI
    #[command(alias = "update")]
    CheckUpdates,
}

impl Args {
    /// Verbose output requested on the command line or in the config file.
    pub fn wants_verbose(&self) -> bool {
        if self.verbose {
            return true;
        }
        let path = match &self.config {
            Some(path) => Some(path.clone()),
            None => Config::default_path().ok(),
        };
        path.and_then(|p| Config::load(&p).ok())
            .map(|c| c.verbose)
            .unwrap_or(false)
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let Args {
            verbose,
            config,
            command,
        } = self;
        // Help and docs run without a config or keychain.
        let context = || Context::new(config.clone(), verbose);
        let prompter = TerminalPrompter::new();

        match command {
            Commands::Help => {
                commands::help();
                Ok(())
            }
            Commands::Docs => {
                commands::docs();
                Ok(())
            }
            Commands::Install => commands::install(&context()?, &prompter),
            Commands::Login => commands::login(&context()?, &prompter),
            Commands::FetchEnv {
                environment,
                output,
                project,
            } => commands::fetch_env(
                &context()?,
                &prompter,
                FetchEnvArgs {
                    environment,
                    output,
                    project,
                },
            )
            .map(drop),
            Commands::Logout => commands::logout(&context()?),
            Commands::Recover {
                environment,
                output,
            } => commands::recover(
                &context()?,
                RecoverArgs {
                    environment,
                    output,
                },
            )
            .map(drop),
            Commands::Interactive => commands::interactive(&context()?, &prompter),
            Commands::CheckUpdates => commands::check_updates(&context()?).map(drop),
        }
    }
}
