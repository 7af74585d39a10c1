//! Transient files: credential key, namespace manifest.
//!
//! Everything lives under one directory that is assumed to be discarded with
//! the execution environment. Only the credential file is cleaned up.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{io_err, PipelineError};

/// File name of the service account key inside the transient directory.
pub const CREDENTIAL_FILE: &str = "gcloud.json";

/// File name of the generated namespace manifest inside the transient directory.
pub const NAMESPACE_FILE: &str = "namespace.yaml";

/// Write `contents` to `path`, readable and writable by the owner only.
pub fn write_private(path: &Path, contents: &[u8]) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(|e| io_err(path, e))?;
    // The mode above only applies to newly created files.
    set_private_permissions(path)?;
    file.write_all(contents).map_err(|e| io_err(path, e))?;
    Ok(())
}

#[cfg(unix)]
fn set_private_permissions(path: &Path) -> Result<(), PipelineError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_private_permissions(_path: &Path) -> Result<(), PipelineError> {
    Ok(())
}

/// The service account key on disk. Removed when dropped; a failed removal is
/// logged and otherwise ignored.
#[derive(Debug)]
pub struct CredentialFile {
    path: PathBuf,
}

impl CredentialFile {
    /// Write `payload` to `<dir>/gcloud.json` with owner-only permissions.
    pub fn create(dir: &Path, payload: &str) -> Result<Self, PipelineError> {
        let path = dir.join(CREDENTIAL_FILE);
        write_private(&path, payload.as_bytes())?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CredentialFile {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "error removing token file"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn credential_file_is_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = {
            let file = CredentialFile::create(dir.path(), "{}").unwrap();
            assert_eq!(fs::read_to_string(file.path()).unwrap(), "{}");
            file.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn drop_tolerates_already_removed_file() {
        let dir = TempDir::new().unwrap();
        let file = CredentialFile::create(dir.path(), "{}").unwrap();
        fs::remove_file(file.path()).unwrap();
        drop(file);
    }

    #[cfg(unix)]
    #[test]
    fn private_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key.json");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        write_private(&path, b"new").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }
}
