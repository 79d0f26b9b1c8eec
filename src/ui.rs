// UI layer: prompts, status lines, spinners and the interactive menu.
// Prompts go through the `Prompter` trait so the command flows can be
// driven without a terminal.

use crate::constants::BIN_NAME;
use crate::error::Result;
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Source of answers for the questions a command asks.
pub trait Prompter {
    fn input(&self, prompt: &str) -> Result<String>;
    /// Like `input`, without echoing what is typed.
    fn password(&self, prompt: &str) -> Result<String>;
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
    /// Index of the chosen item.
    fn select(&self, prompt: &str, items: &[&str]) -> Result<usize>;
}

/// Keyboard-driven prompts in the terminal.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn input(&self, prompt: &str) -> Result<String> {
        let value: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact_text()?;
        Ok(value.trim().to_string())
    }

    fn password(&self, prompt: &str) -> Result<String> {
        Ok(Password::with_theme(&self.theme)
            .with_prompt(prompt)
            .interact()?)
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }

    fn select(&self, prompt: &str, items: &[&str]) -> Result<usize> {
        Ok(Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact()?)
    }
}

pub fn success(msg: &str) {
    println!("{}", format!("✅  {}", msg).green());
}

pub fn warning(msg: &str) {
    println!("{}", format!("⚠️  {}", msg).yellow());
}

/// Yellow line without the warning icon; the caller supplies its own.
pub fn note(msg: &str) {
    println!("{}", msg.yellow());
}

pub fn info(msg: &str) {
    println!("{}", msg.blue());
}

/// Extra detail shown only in verbose mode.
pub fn detail(msg: &str) {
    println!("{}", msg.dimmed());
}

pub fn error(msg: &str) {
    eprintln!("{}", format!("❌  {}", msg).red());
}

/// Spinner shown while a request is in flight. Call `finish_and_clear`
/// on the returned bar when done.
pub fn spinner(msg: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(msg.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// (icon, usage, description) for every command.
const COMMANDS: [(&str, &str, &str); 9] = [
    ("🔑", "login", "Log in to your Meritt account"),
    (
        "🌐",
        "fetch-env [environment]",
        "Fetch and create a .env file for the current project and specified environment",
    ),
    ("📤", "logout", "Log out of your Meritt account"),
    ("📚", "docs", "Open the Meritt CLI documentation in your browser"),
    ("⚙️", "install", "Set up the Meritt CLI configuration file"),
    ("ℹ️", "help", "Display help information"),
    ("💾", "recover [environment]", "Restore the .env file from backup"),
    ("💬", "interactive", "Start the CLI in interactive mode"),
    ("⚠️", "check-updates", "Check for updates to the Meritt CLI"),
];

#[derive(Tabled)]
struct CommandRow {
    #[tabled(rename = "Command")]
    command: String,
    #[tabled(rename = "Description")]
    description: &'static str,
}

/// Table listing every command, printed by `meritt help`.
pub fn help_table() -> String {
    let rows = COMMANDS.iter().map(|(icon, usage, description)| CommandRow {
        command: format!("{} {} {}", icon, BIN_NAME, usage),
        description,
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Entries of the interactive menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Login,
    FetchEnv,
    Logout,
    Recover,
    CheckUpdates,
    Help,
    Exit,
}

impl MenuItem {
    pub const ALL: [MenuItem; 7] = [
        MenuItem::Login,
        MenuItem::FetchEnv,
        MenuItem::Logout,
        MenuItem::Recover,
        MenuItem::CheckUpdates,
        MenuItem::Help,
        MenuItem::Exit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::Login => "login",
            MenuItem::FetchEnv => "fetch-env",
            MenuItem::Logout => "logout",
            MenuItem::Recover => "recover",
            MenuItem::CheckUpdates => "check-updates",
            MenuItem::Help => "help",
            MenuItem::Exit => "exit",
        }
    }
}

/// Interactive menu. Runs a select loop and hands each choice to `run`
/// until the user picks "exit". A failing command is reported and the
/// loop continues.
pub fn main_menu<F>(prompter: &dyn Prompter, mut run: F) -> Result<()>
where
    F: FnMut(MenuItem) -> Result<()>,
{
    let labels: Vec<&str> = MenuItem::ALL.iter().map(MenuItem::label).collect();
    loop {
        let selection = prompter.select("What would you like to do?", &labels)?;
        let item = MenuItem::ALL
            .get(selection)
            .copied()
            .unwrap_or(MenuItem::Exit);
        if item == MenuItem::Exit {
            break;
        }
        if let Err(e) = run(item) {
            error(&e.to_string());
        }
    }
    Ok(())
}
