// Command handlers. Each subcommand is a straight-line flow over config,
// the credential store, the API and the local filesystem.

use crate::api::ApiClient;
use crate::config::{self, Config};
use crate::constants::{
    APP_VERSION, CRATES_IO_API, DEFAULT_ENV_FILE, DOCS_URL, UPDATE_CMD, VALID_ENVIRONMENTS,
};
use crate::credentials::TokenStore;
use crate::env_file::{self, Environment};
use crate::error::{CliError, Result};
use crate::project;
use crate::ui::{self, MenuItem, Prompter};
use crate::update::{UpdateChecker, UpdateStatus};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Everything a command needs from its surroundings.
pub struct Context {
    /// Location of `config.json`.
    pub config_path: PathBuf,
    /// Directory env files are read from and written to.
    pub work_dir: PathBuf,
    pub tokens: TokenStore,
    /// Set by `--verbose`; `verbose` in the config file also enables it.
    pub verbose: bool,
    /// crates.io API base used by `check-updates`.
    pub registry_url: String,
}

impl Context {
    /// Context for a normal run: the OS keychain, the current directory and
    /// the config at `config_path` (or the default location).
    pub fn new(config_path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => Config::default_path()?,
        };
        // The credential file stays in ~/.meritt whatever --config says.
        let store_dir = Config::default_dir()?;
        Ok(Self {
            tokens: TokenStore::system(&store_dir),
            config_path,
            work_dir: std::env::current_dir()?,
            verbose,
            registry_url: CRATES_IO_API.to_string(),
        })
    }

    fn load_config(&self) -> Result<Config> {
        Config::load(&self.config_path)
    }
}

/// Options of `meritt fetch-env`.
#[derive(Debug, Default, Clone)]
pub struct FetchEnvArgs {
    pub environment: Option<String>,
    pub output: Option<PathBuf>,
    pub project: Option<String>,
}

/// Options of `meritt recover`.
#[derive(Debug, Default, Clone)]
pub struct RecoverArgs {
    pub environment: Option<String>,
    pub output: Option<PathBuf>,
}

/// Ask for the API URL and verbosity and write the config file.
pub fn install(ctx: &Context, prompter: &dyn Prompter) -> Result<()> {
    // reject a bad URL before asking anything else
    let api_url = prompter.input("Enter the API URL:")?;
    config::validate_api_url(&api_url)?;
    let verbose = prompter.confirm("Enable verbose logging?", false)?;

    // save creates the config directory when it is missing
    let config = Config { api_url, verbose };
    config.save(&ctx.config_path)?;
    ui::success(&format!(
        "Config file created at {}",
        ctx.config_path.display()
    ));

    println!("{}", "📚  Documentation for config.json:".cyan());
    println!("{}", config::documentation(&ctx.config_path));
    Ok(())
}

/// Exchange email and password for a token pair and store it.
pub fn login(ctx: &Context, prompter: &dyn Prompter) -> Result<()> {
    let config = ctx.load_config()?;
    let api = ApiClient::new(config.api_url())?;
    ui::info("🔑  Logging in to Meritt...");

    let email = prompter.input("Enter your email:")?;
    if email.is_empty() {
        return Err(CliError::invalid_argument("email must not be empty"));
    }
    // `password` hides what is typed
    let password = prompter.password("Enter your password:")?;

    // clear the spinner before any error is printed
    let spinner = ui::spinner("Logging in...");
    let result = api.login(&email, &password);
    spinner.finish_and_clear();
    let tokens = result?;

    // keychain first, credentials file if there is none
    ctx.tokens.save(&tokens)?;
    ui::success("Login successful!");
    Ok(())
}

/// Download the env file of the current project for one environment and
/// write it next to the project, backing up any file already there.
/// Returns the path written.
pub fn fetch_env(ctx: &Context, prompter: &dyn Prompter, args: FetchEnvArgs) -> Result<PathBuf> {
    let config = ctx.load_config()?;
    // --project wins over package.json / Cargo.toml
    let project = match args.project {
        Some(name) => name,
        None => project::detect_project_name(&ctx.work_dir)?,
    };

    let environment: Environment = match args.environment {
        Some(name) => name.parse()?,
        // no argument: let the user pick one
        None => {
            let index = prompter.select("Select the environment:", &VALID_ENVIRONMENTS)?;
            Environment::ALL
                .get(index)
                .copied()
                .ok_or_else(|| CliError::InvalidEnvironment(index.to_string()))?
        }
    };

    if ctx.verbose || config.verbose {
        ui::detail(&format!("Fetching .env file for project: {}", project));
        ui::detail(&format!("Environment: {}", environment));
    }

    let tokens = ctx.tokens.load()?.ok_or(CliError::NotLoggedIn)?;
    let api = ApiClient::new(config.api_url())?;

    // look up the download location, then fetch the file itself
    let spinner = ui::spinner("Fetching env file...");
    let fetched = api
        .env_file_location(&project, environment, &tokens)
        .and_then(|location| {
            debug!("Env file location: {}", location);
            api.download(&location)
        });
    spinner.finish_and_clear();
    let contents = fetched?;

    // an existing file is copied to <file>.backup first
    let path = env_file::resolve_path(&ctx.work_dir, args.output.as_deref(), environment);
    if let Some(backup) = env_file::write_with_backup(&path, &contents)? {
        ui::note(&format!("💾  Backup created: {}", backup.display()));
    }
    ui::success(&format!("{} file created successfully!", display_name(&path)));
    Ok(path)
}

/// Forget the stored token pair.
pub fn logout(ctx: &Context) -> Result<()> {
    ctx.tokens.clear()?;
    ui::success("Logged out successfully!");
    Ok(())
}

pub fn help() {
    println!("{}", "📚  Meritt CLI Help\n".cyan());
    println!("{}", ui::help_table());
}

pub fn docs() {
    match open::that(DOCS_URL) {
        Ok(()) => ui::info(&format!("📚  Opening {}", DOCS_URL)),
        Err(e) => {
            warn!("Could not open browser: {}", e);
            ui::info(&format!("📚  Documentation: {}", DOCS_URL));
        }
    }
}

/// Put an env file's backup back in place. Returns the restored path.
pub fn recover(ctx: &Context, args: RecoverArgs) -> Result<PathBuf> {
    let environment = args
        .environment
        .as_deref()
        .map(str::parse::<Environment>)
        .transpose()?;
    // same path rules as fetch-env, plain .env when nothing is given
    let path = match (environment, args.output.as_deref()) {
        (Some(environment), output) => {
            env_file::resolve_path(&ctx.work_dir, output, environment)
        }
        (None, Some(output)) => ctx.work_dir.join(output),
        (None, None) => ctx.work_dir.join(DEFAULT_ENV_FILE),
    };

    env_file::restore(&path)?;
    ui::success(&format!("{} file restored from backup.", display_name(&path)));
    Ok(path)
}

pub fn check_updates(ctx: &Context) -> Result<UpdateStatus> {
    let checker = UpdateChecker::new(ctx.registry_url.as_str())?;
    let spinner = ui::spinner("Checking for updates...");
    let status = checker.check(APP_VERSION);
    spinner.finish_and_clear();
    let status = status?;

    // report only; updating is left to the user
    match &status {
        UpdateStatus::UpToDate(version) => ui::success(&format!(
            "You are using the latest version ({}).",
            version
        )),
        UpdateStatus::Available { latest } => ui::warning(&format!(
            "A new version ({}) is available. Run `{}` to update.",
            latest, UPDATE_CMD
        )),
    }
    Ok(status)
}

/// Menu-driven mode: keep offering commands until the user exits.
pub fn interactive(ctx: &Context, prompter: &dyn Prompter) -> Result<()> {
    ui::main_menu(prompter, |item| match item {
        MenuItem::Login => login(ctx, prompter),
        MenuItem::FetchEnv => fetch_env(ctx, prompter, FetchEnvArgs::default()).map(drop),
        MenuItem::Logout => logout(ctx),
        MenuItem::Recover => {
            // first entry is the plain .env file
            let mut choices = vec![DEFAULT_ENV_FILE];
            choices.extend(VALID_ENVIRONMENTS);
            let index = prompter.select("Which env file should be restored?", &choices)?;
            let environment = (index > 0).then(|| choices[index].to_string());
            recover(
                ctx,
                RecoverArgs {
                    environment,
                    output: None,
                },
            )
            .map(drop)
        }
        MenuItem::CheckUpdates => check_updates(ctx).map(drop),
        MenuItem::Help => {
            help();
            Ok(())
        }
        MenuItem::Exit => Ok(()),
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
