// Project name detection from the metadata file in the working directory.

use crate::error::{CliError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Deserialize)]
struct PackageJson {
    name: Option<String>,
}

#[derive(Deserialize)]
struct CargoManifest {
    package: Option<CargoPackage>,
}

#[derive(Deserialize)]
struct CargoPackage {
    name: Option<String>,
}

/// Name of the project in `dir`, taken from `package.json` or, failing
/// that, `Cargo.toml`.
pub fn detect_project_name(dir: &Path) -> Result<String> {
    let sources: [(&str, fn(&str) -> Result<Option<String>>); 2] = [
        ("package.json", name_from_package_json),
        ("Cargo.toml", name_from_cargo_toml),
    ];

    for (file, parse) in sources {
        let path = dir.join(file);
        if !path.is_file() {
            continue;
        }
        let parsed = fs::read_to_string(&path)
            .map_err(CliError::from)
            .and_then(|content| parse(&content));
        match parsed {
            Ok(Some(name)) => {
                debug!("Project name '{}' from {}", name, path.display());
                return Ok(name);
            }
            Ok(None) => debug!("{} has no project name", path.display()),
            Err(e) => warn!("Error reading {}: {}", path.display(), e),
        }
    }

    Err(CliError::ProjectNameMissing)
}

fn non_empty(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

fn name_from_package_json(content: &str) -> Result<Option<String>> {
    let package: PackageJson = serde_json::from_str(content)?;
    Ok(non_empty(package.name))
}

fn name_from_cargo_toml(content: &str) -> Result<Option<String>> {
    let manifest: CargoManifest = toml::from_str(content)?;
    Ok(non_empty(manifest.package.and_then(|p| p.name)))
}
