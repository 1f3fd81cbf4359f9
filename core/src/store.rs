use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::ProfileStoreError;
use crate::events::{EventSink, KernelEvent};
use crate::profile::LearnerProfile;

/// Stable storage key of the learner profile.
pub const PROFILE_STORAGE_KEY: &str = "eai_learner_profile";

/// Keyed storage for the learner profile.
pub trait ProfileStore: Send + Sync {
    fn load(&self) -> Result<Option<LearnerProfile>, ProfileStoreError>;
    fn save(&self, profile: &LearnerProfile) -> Result<(), ProfileStoreError>;
    fn clear(&self) -> Result<(), ProfileStoreError>;
}

/// Load the stored profile. Unreadable or corrupt data counts as absent.
pub fn load_profile(store: &dyn ProfileStore, events: &dyn EventSink) -> Option<LearnerProfile> {
    match store.load() {
        Ok(profile) => profile.map(LearnerProfile::normalized),
        Err(err) => {
            events.emit(KernelEvent::ProfilePersistenceFailed {
                reason: err.to_string(),
            });
            None
        }
    }
}

/// One JSON file per profile under a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{PROFILE_STORAGE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ProfileStoreError {
        ProfileStoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl ProfileStore for JsonFileStore {
    fn load(&self) -> Result<Option<LearnerProfile>, ProfileStoreError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        Ok(Some(serde_json::from_str(&data)?))
    }

    fn save(&self, profile: &LearnerProfile) -> Result<(), ProfileStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let data = serde_json::to_string_pretty(profile)?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        file.write_all(data.as_bytes())
            .map_err(|e| self.io_error(e))?;

        Ok(())
    }

    fn clear(&self) -> Result<(), ProfileStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    profile: Mutex<Option<LearnerProfile>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryStore {
    fn load(&self) -> Result<Option<LearnerProfile>, ProfileStoreError> {
        Ok(self.profile.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, profile: &LearnerProfile) -> Result<(), ProfileStoreError> {
        *self.profile.lock().unwrap_or_else(|e| e.into_inner()) = Some(profile.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ProfileStoreError> {
        *self.profile.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

#[cfg(not(unix))]
trait OpenOptionsExt {
    fn mode(&mut self, _mode: u32) -> &mut Self;
}

#[cfg(not(unix))]
impl OpenOptionsExt for std::fs::OpenOptions {
    fn mode(&mut self, _mode: u32) -> &mut Self {
        self
    }
}
