// Files holding secrets: env files and the fallback credential file.

use std::fs;
use std::io;
use std::path::Path;

/// Open `path` for writing, truncated, readable only by the owner.
#[cfg(unix)]
pub fn create_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
pub fn create_private(path: &Path) -> io::Result<fs::File> {
    fs::File::create(path)
}
