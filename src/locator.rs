//! Mail database discovery
//!
//! Mail keeps its envelope index under `~/Library/Mail/V<n>/MailData/`.
//! Newer layouts get higher version numbers, so the highest `V<n>` that
//! actually contains the index wins. An explicit override path, passed in
//! at construction, short-circuits the scan.

use std::io::{self, ErrorKind};
use std::path::PathBuf;

use regex::Regex;
use tracing::debug;

use crate::errors::{AppError, AppResult};

/// Locates the `Envelope Index` database
#[derive(Debug, Clone)]
pub struct DbLocator {
    override_path: Option<PathBuf>,
    mail_root: PathBuf,
}

impl DbLocator {
    pub fn new(override_path: Option<PathBuf>, mail_root: impl Into<PathBuf>) -> Self {
        Self {
            override_path: override_path.filter(|p| !p.as_os_str().is_empty()),
            mail_root: mail_root.into(),
        }
    }

    /// Resolve the database path
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` if the mail root cannot be read
    /// - `NotFound` if no version directory holds the index
    pub async fn locate(&self) -> AppResult<PathBuf> {
        if let Some(path) = &self.override_path {
            debug!(path = %path.display(), "using mail database override");
            return Ok(path.clone());
        }

        for dir in self.version_dirs().await? {
            let candidate = self
                .mail_root
                .join(&dir)
                .join("MailData")
                .join("Envelope Index");
            match tokio::fs::try_exists(&candidate).await {
                Ok(true) => {
                    debug!(path = %candidate.display(), "found mail database");
                    return Ok(candidate);
                }
                _ => continue,
            }
        }

        Err(AppError::NotFound(format!(
            "Could not find Mail database in {}. Ensure you have 'Full Disk Access' enabled.",
            self.mail_root.display()
        )))
    }

    /// `V<n>` directory names under the mail root, highest version first
    ///
    /// A missing or unreadable-for-other-reasons root yields no directories.
    async fn version_dirs(&self) -> AppResult<Vec<String>> {
        let pattern = Regex::new(r"^V(\d+)$")
            .map_err(|e| AppError::Internal(format!("invalid version regex: {e}")))?;

        let mut entries = match tokio::fs::read_dir(&self.mail_root).await {
            Ok(entries) => entries,
            Err(e) => return self.read_failure(&e).map_or(Ok(Vec::new()), Err),
        };

        let mut versions: Vec<(u64, String)> = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => match self.read_failure(&e) {
                    Some(err) => return Err(err),
                    None => break,
                },
            };
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            let name = entry.file_name().to_string_lossy().into_owned();
            let version = pattern
                .captures(&name)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<u64>().ok());
            if let (true, Some(version)) = (is_dir, version) {
                versions.push((version, name));
            }
        }

        versions.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(versions.into_iter().map(|(_, name)| name).collect())
    }

    /// Error to surface for a failed read of the mail root, if any
    ///
    /// Only permission problems are reported; anything else is treated as
    /// having no version directories.
    fn read_failure(&self, err: &io::Error) -> Option<AppError> {
        (err.kind() == ErrorKind::PermissionDenied).then(|| {
            AppError::PermissionDenied(format!(
                "Permission denied accessing {}. Please grant Terminal 'Full Disk Access' in System Settings.",
                self.mail_root.display()
            ))
        })
    }
}
