use std::fs::Permissions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::job::Job;
use crate::{Error, Result};

/// Mode of a freshly created store file on unix (rw-r--r--)
#[cfg(unix)]
const NEW_STORE_MODE: u32 = 0o644;

/// The job list on disk, a single JSON array replaced as a whole
#[derive(Debug, Clone)]
pub struct JobStore {
    path: PathBuf,
}

impl JobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all jobs; an absent, unreadable or invalid file reads as empty
    pub fn load(&self) -> Vec<Job> {
        match self.try_load() {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::warn!("{}; starting from an empty job list", e);
                Vec::new()
            }
        }
    }

    /// Load all jobs, reporting unreadable or invalid content as `StoreRead`.
    /// An absent file is an empty store, not an error.
    pub fn try_load(&self) -> Result<Vec<Job>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.read_error(e)),
        };

        serde_json::from_str(&content).map_err(|e| self.read_error(e))
    }

    /// Replace the stored list with `jobs`.
    ///
    /// The new content goes to a temp file next to the target and is renamed
    /// over it, so readers see either the old list or the new one in full.
    /// On failure the previous file is left as it was.
    pub fn save(&self, jobs: &[Job]) -> Result<()> {
        let content = serde_json::to_string_pretty(jobs)?;
        self.write_atomic(content.as_bytes())
            .map_err(|source| Error::StoreWrite {
                path: self.path.clone(),
                source,
            })?;

        tracing::info!(path = %self.path.display(), count = jobs.len(), "Saved job list");
        Ok(())
    }

    fn write_atomic(&self, content: &[u8]) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.as_file().set_permissions(self.target_permissions(tmp.as_file())?)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        Ok(())
    }

    /// Permissions for the replacement file: those of the file being
    /// replaced, or world-readable for a new store. Temp files start out
    /// owner-only and `persist` would carry that over.
    fn target_permissions(&self, tmp: &std::fs::File) -> io::Result<Permissions> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.permissions()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                #[allow(unused_mut)]
                let mut permissions = tmp.metadata()?.permissions();
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    permissions.set_mode(NEW_STORE_MODE);
                }
                Ok(permissions)
            }
            Err(e) => Err(e),
        }
    }

    fn read_error(&self, reason: impl ToString) -> Error {
        Error::StoreRead {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}
