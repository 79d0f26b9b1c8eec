// Config file handling. The file is a small JSON record kept in
// `~/.meritt/config.json` and written by `meritt install`.

use crate::constants::{API_URL_ENV, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Contents of `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the Meritt API, e.g. `https://api-dev.meritt.dev`.
    pub api_url: String,
    /// Print extra detail while running commands.
    #[serde(default)]
    pub verbose: bool,
}

impl Config {
    /// `~/.meritt`
    pub fn default_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::invalid_config("could not determine home directory"))?;
        Ok(home.join(CONFIG_DIR_NAME))
    }

    /// `~/.meritt/config.json`
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::default_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load the config from `path`. A missing file tells the user to run
    /// `meritt install`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CliError::ConfigNotFound(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };
        let config: Config = serde_json::from_str(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the config to `path`, creating (and on Windows hiding) its
    /// directory first.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
                hide_dir(dir);
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Base URL to use for API calls. `MERITT_API_URL` overrides the stored value.
    pub fn api_url(&self) -> String {
        self.api_url_with(std::env::var(API_URL_ENV).ok())
    }

    fn api_url_with(&self, override_url: Option<String>) -> String {
        let url = override_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| self.api_url.clone());
        url.trim().trim_end_matches('/').to_string()
    }
}

/// Check that `url` is an absolute http(s) URL before it is written to the config.
pub fn validate_api_url(url: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url.trim())
        .map_err(|e| CliError::invalid_config(format!("'{}' is not a valid URL: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(CliError::invalid_config(format!(
            "API URL must use http or https, got '{}'",
            other
        ))),
    }
}

#[cfg(windows)]
fn hide_dir(dir: &Path) {
    let status = std::process::Command::new("attrib")
        .arg("+h")
        .arg(dir)
        .status();
    if let Err(e) = status {
        tracing::warn!("Could not hide {}: {}", dir.display(), e);
    }
}

#[cfg(not(windows))]
fn hide_dir(_dir: &Path) {}

/// Help text printed after `meritt install`.
pub fn documentation(path: &Path) -> String {
    let path = path.display();
    format!(
        r#"
The config.json file allows you to customize the behavior of the Meritt CLI.

Here are the available options:

1. apiUrl: The base URL for the Meritt API.
   Example: "https://api-dev.meritt.dev"

2. verbose: Enable verbose logging for debugging.
   Example: true or false

The {env} environment variable overrides apiUrl for a single run.

To edit the config file, open it in your preferred text editor:
vi {path} or code {path}
"#,
        env = API_URL_ENV,
        path = path
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_url: "https://api-dev.meritt.dev".into(),
            verbose: true,
        };

        config.save(&path).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"apiUrl\""));

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_verbose_defaults_to_false() {
        let config: Config = serde_json::from_str(r#"{"apiUrl":"http://localhost:3000"}"#).unwrap();
        assert!(!config.verbose);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        match Config::load(&path) {
            Err(CliError::ConfigNotFound(p)) => assert_eq!(p, path),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load(&path), Err(CliError::Json(_))));
    }

    #[test]
    fn test_api_url_override_and_trailing_slash() {
        let config = Config {
            api_url: "https://api.meritt.dev/".into(),
            verbose: false,
        };
        assert_eq!(config.api_url_with(None), "https://api.meritt.dev");
        assert_eq!(
            config.api_url_with(Some("http://localhost:8080//".into())),
            "http://localhost:8080"
        );
        assert_eq!(config.api_url_with(Some("  ".into())), "https://api.meritt.dev");
    }

    #[test]
    fn test_validate_api_url() {
        assert!(validate_api_url("https://api.meritt.dev").is_ok());
        assert!(validate_api_url("http://localhost:3000").is_ok());
        assert!(validate_api_url("api.meritt.dev").is_err());
        assert!(validate_api_url("ftp://api.meritt.dev").is_err());
    }

    #[test]
    fn test_documentation_mentions_path() {
        let doc = documentation(Path::new("/home/me/.meritt/config.json"));
        assert!(doc.contains("vi /home/me/.meritt/config.json"));
        assert!(doc.contains("apiUrl"));
    }
}
