//! Local attachment state
//!
//! The service keeps no record of an attachment, so the identity handed out
//! by create is the only thing that ties a declared spec to a live
//! membership. It is persisted as a small JSON file next to the spec.

use crate::config::AttachmentSpec;
use crate::identity::AttachmentId;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Recorded attachment: identity plus the spec it was created from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentState {
    pub id: AttachmentId,
    pub spec: AttachmentSpec,
    pub created_at: DateTime<Utc>,
    /// Create attached but the read-back failed; the next apply replaces it
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub tainted: bool,
}

impl AttachmentState {
    pub fn new(id: AttachmentId, spec: AttachmentSpec) -> Self {
        Self {
            id,
            spec,
            created_at: Utc::now(),
            tainted: false,
        }
    }

    pub fn tainted(mut self) -> Self {
        self.tainted = true;
        self
    }
}

/// JSON file holding at most one [`AttachmentState`]
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the recorded state, `None` if the file does not exist
    pub fn load(&self) -> Result<Option<AttachmentState>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read state file: {}", self.path.display())
                });
            }
        };

        let state = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", self.path.display()))?;
        Ok(Some(state))
    }

    /// Write the state, replacing the file atomically
    pub fn save(&self, state: &AttachmentState) -> Result<()> {
        let json = serde_json::to_string_pretty(state).context("Failed to serialize state")?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace state file: {}", self.path.display()))?;
        Ok(())
    }

    /// Store `state`, or remove the file when there is none
    pub fn store(&self, state: Option<&AttachmentState>) -> Result<()> {
        match state {
            Some(state) => self.save(state),
            None => self.clear(),
        }
    }

    /// Remove the state file; missing is fine
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove state file: {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn state() -> AttachmentState {
        AttachmentState::new(
            AttachmentId::generate("asg-1"),
            AttachmentSpec::by_target_group("asg-1", "tg-123"),
        )
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let file = StateFile::new(dir.path().join("state.json"));
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let file = StateFile::new(dir.path().join("state.json"));
        let state = state();

        file.save(&state).unwrap();
        assert_eq!(file.load().unwrap(), Some(state));
        assert!(!dir.path().join("state.tmp").exists());
    }

    #[test]
    fn tainted_flag_is_only_written_when_set() {
        let clean = serde_json::to_string(&state()).unwrap();
        assert!(!clean.contains("tainted"));

        let tainted = serde_json::to_string(&state().tainted()).unwrap();
        assert!(tainted.contains(r#""tainted":true"#));
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let file = StateFile::new(dir.path().join("state.json"));
        file.save(&state()).unwrap();

        file.clear().unwrap();
        file.clear().unwrap();
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").unwrap();

        let err = StateFile::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("Failed to parse state file"));
    }
}
