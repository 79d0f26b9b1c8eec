// Env file placement, backup and restore. An existing env file is always
// copied to `<file>.backup` before it is replaced.

use crate::constants::{BACKUP_SUFFIX, VALID_ENVIRONMENTS};
use crate::error::{CliError, Result};
use crate::secure_fs;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Deployment environment an env file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub const ALL: [Environment; 3] = [
        Environment::Development,
        Environment::Staging,
        Environment::Production,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => VALID_ENVIRONMENTS[0],
            Environment::Staging => VALID_ENVIRONMENTS[1],
            Environment::Production => VALID_ENVIRONMENTS[2],
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        Environment::ALL
            .into_iter()
            .find(|env| env.as_str() == s)
            .ok_or_else(|| CliError::InvalidEnvironment(s.to_string()))
    }
}

/// `dir/.env.<environment>`
pub fn default_path(dir: &Path, environment: Environment) -> PathBuf {
    dir.join(format!(".env.{}", environment))
}

/// Where to write the env file: `output` if given (relative to `dir`),
/// the per-environment default otherwise.
pub fn resolve_path(dir: &Path, output: Option<&Path>, environment: Environment) -> PathBuf {
    match output {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => dir.join(path),
        None => default_path(dir, environment),
    }
}

/// `<path>.backup`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Write `contents` to `path`, first copying any existing file to its backup
/// path. Returns the backup path when one was made.
pub fn write_with_backup(path: &Path, contents: &[u8]) -> Result<Option<PathBuf>> {
    let backup = if path.exists() {
        let backup = backup_path(path);
        fs::copy(path, &backup)?;
        debug!("Backed up {} to {}", path.display(), backup.display());
        Some(backup)
    } else {
        None
    };

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    // Created 0600 so the secrets are never readable by others.
    let mut file = secure_fs::create_private(path)?;
    file.write_all(contents)?;
    debug!("Wrote {} bytes to {}", contents.len(), path.display());

    Ok(backup)
}

/// Copy `<path>.backup` back over `path`. The backup itself is kept.
pub fn restore(path: &Path) -> Result<PathBuf> {
    let backup = backup_path(path);
    if !backup.is_file() {
        return Err(CliError::NoBackup(backup));
    }
    fs::copy(&backup, path)?;
    debug!("Restored {} from {}", path.display(), backup.display());
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_environment() {
        assert_eq!("staging".parse::<Environment>().unwrap(), Environment::Staging);
        assert_eq!(
            "production".parse::<Environment>().unwrap().to_string(),
            "production"
        );
        assert!(matches!(
            "Production".parse::<Environment>(),
            Err(CliError::InvalidEnvironment(e)) if e == "Production"
        ));
        assert!("qa".parse::<Environment>().is_err());
    }

    #[test]
    fn test_paths() {
        let dir = Path::new("/work/app");
        assert_eq!(
            resolve_path(dir, None, Environment::Development),
            PathBuf::from("/work/app/.env.development")
        );
        assert_eq!(
            resolve_path(dir, Some(Path::new("config/.env")), Environment::Staging),
            PathBuf::from("/work/app/config/.env")
        );
        assert_eq!(
            resolve_path(dir, Some(Path::new("/etc/app.env")), Environment::Staging),
            PathBuf::from("/etc/app.env")
        );
        assert_eq!(
            backup_path(Path::new("/work/app/.env.staging")),
            PathBuf::from("/work/app/.env.staging.backup")
        );
    }

    #[test]
    fn test_write_new_file_makes_no_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env.staging");

        let backup = write_with_backup(&path, b"A=1\n").unwrap();

        assert_eq!(backup, None);
        assert_eq!(fs::read_to_string(&path).unwrap(), "A=1\n");
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_overwrite_backs_up_previous_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env.production");
        fs::write(&path, "OLD=1\n").unwrap();

        let backup = write_with_backup(&path, b"NEW=2\n").unwrap();

        assert_eq!(backup, Some(backup_path(&path)));
        assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), "OLD=1\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "NEW=2\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_new_file_is_created_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(".env.staging");

        write_with_backup(&path, b"SECRET=1").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_written_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env.development");
        fs::write(&path, "X=1").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        write_with_backup(&path, b"X=2").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_restore() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "GOOD=1\n").unwrap();
        write_with_backup(&path, b"BAD=1\n").unwrap();

        restore(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "GOOD=1\n");
        assert!(backup_path(&path).exists());
    }

    #[test]
    fn test_restore_without_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "KEEP=1\n").unwrap();

        assert!(matches!(restore(&path), Err(CliError::NoBackup(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), "KEEP=1\n");
    }
}
