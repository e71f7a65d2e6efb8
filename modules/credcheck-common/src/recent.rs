//! Local "recent checks" list: a bounded, newest-first JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CredcheckError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentCheck {
    pub uid: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    /// "analyzing", "completed" or "error".
    pub status: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

pub struct RecentChecks {
    path: PathBuf,
    capacity: usize,
}

impl RecentChecks {
    pub const DEFAULT_CAPACITY: usize = 50;

    pub fn open(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity: capacity.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored checks, newest first. A missing file is an empty list; an
    /// unreadable one is logged and treated as empty.
    pub fn list(&self) -> Result<Vec<RecentCheck>, CredcheckError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let bytes = fs::read(&self.path)?;
        match serde_json::from_slice(&bytes) {
            Ok(checks) => Ok(checks),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Recent checks file is corrupt, ignoring");
                Ok(Vec::new())
            }
        }
    }

    /// Insert at the front and drop the oldest entries beyond capacity.
    pub fn append(&self, check: RecentCheck) -> Result<(), CredcheckError> {
        let mut checks = self.list()?;
        checks.retain(|c| c.uid != check.uid);
        checks.insert(0, check);
        checks.truncate(self.capacity);
        self.write(&checks)
    }

    pub fn find(&self, uid: &str) -> Result<Option<RecentCheck>, CredcheckError> {
        Ok(self.list()?.into_iter().find(|c| c.uid == uid))
    }

    /// Returns false when no check with that uid is stored.
    pub fn update_status(&self, uid: &str, status: &str) -> Result<bool, CredcheckError> {
        let mut checks = self.list()?;
        let Some(check) = checks.iter_mut().find(|c| c.uid == uid) else {
            return Ok(false);
        };
        check.status = status.to_string();
        self.write(&checks)?;
        Ok(true)
    }

    /// Per-install client session id, created on first use.
    pub fn session_id(&self) -> Result<String, CredcheckError> {
        let path = self.session_id_path();
        if let Ok(existing) = fs::read_to_string(&path) {
            let existing = existing.trim();
            if !existing.is_empty() {
                return Ok(existing.to_string());
            }
        }
        let simple = Uuid::new_v4().simple().to_string();
        let id = format!("session_{}_{}", Utc::now().timestamp_millis(), &simple[..9]);
        self.ensure_dir()?;
        fs::write(&path, &id)?;
        Ok(id)
    }

    fn session_id_path(&self) -> PathBuf {
        self.path.with_file_name("session_id")
    }

    fn ensure_dir(&self) -> Result<(), CredcheckError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }

    fn write(&self, checks: &[RecentCheck]) -> Result<(), CredcheckError> {
        self.ensure_dir()?;
        let bytes = serde_json::to_vec_pretty(checks)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
