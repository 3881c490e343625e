//! Durable slot for the account list
//!
//! The whole list is serialized as one JSON array on every save. Loading is
//! infallible: a missing, unreadable or malformed slot reads as empty.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use super::types::Account;
use crate::error::StoreError;

pub trait AccountBackend: Send {
    /// Read the persisted list. Never fails; bad content reads as empty.
    fn load(&self) -> Vec<Account>;

    /// Replace the persisted list with `accounts`.
    fn save(&self, accounts: &[Account]) -> Result<(), StoreError>;
}

fn decode(raw: &str, origin: &str) -> Vec<Account> {
    match serde_json::from_str::<Vec<Account>>(raw) {
        Ok(accounts) => accounts,
        Err(e) => {
            warn!("Ignoring unreadable account data in {}: {}", origin, e);
            Vec::new()
        }
    }
}

fn encode(accounts: &[Account]) -> Result<String, StoreError> {
    serde_json::to_string_pretty(accounts).map_err(|e| StoreError::Serialize(e.to_string()))
}

/// Stores the list in a JSON file.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl AccountBackend for JsonFileBackend {
    fn load(&self) -> Vec<Account> {
        match fs::read_to_string(&self.path) {
            Ok(data) => decode(&data, &self.path.display().to_string()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No account file at {}, starting empty", self.path.display());
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to read {}: {}. Starting empty.", self.path.display(), e);
                Vec::new()
            }
        }
    }

    fn save(&self, accounts: &[Account]) -> Result<(), StoreError> {
        let json = encode(accounts)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }

        // Write-then-rename so readers never see a half-written slot
        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|e| StoreError::Io(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::Io(e.to_string()))
    }
}

/// In-memory slot. Clones share the same slot, which lets a test reopen a
/// store over data written by another one.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    slot: Arc<Mutex<Option<String>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from raw slot content, valid or not.
    pub fn with_raw(raw: &str) -> Self {
        let backend = Self::new();
        if let Ok(mut slot) = backend.slot.lock() {
            *slot = Some(raw.to_string());
        }
        backend
    }

    /// Current raw slot content
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }

    /// Make subsequent saves fail
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut f) = self.fail_writes.lock() {
            *f = fail;
        }
    }
}

impl AccountBackend for MemoryBackend {
    fn load(&self) -> Vec<Account> {
        match self.raw() {
            Some(raw) => decode(&raw, "memory slot"),
            None => Vec::new(),
        }
    }

    fn save(&self, accounts: &[Account]) -> Result<(), StoreError> {
        if self.fail_writes.lock().map(|f| *f).unwrap_or(false) {
            return Err(StoreError::Io("memory slot is read-only".to_string()));
        }
        let json = encode(accounts)?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| StoreError::Io(e.to_string()))?;
        *slot = Some(json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Account> {
        vec![
            Account::new("u1".into(), "p1".into(), None),
            Account::new("u2".into(), "p2".into(), Some("Bob".into())),
        ]
    }

    #[test]
    fn test_file_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path().join("nested").join("accounts.json"));

        assert!(backend.load().is_empty());

        let accounts = sample();
        backend.save(&accounts).unwrap();
        assert_eq!(backend.load(), accounts);
        assert!(!backend.temp_path().exists());
    }

    #[test]
    fn test_file_backend_corrupt_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        fs::write(&path, "{ definitely not an array").unwrap();

        let backend = JsonFileBackend::new(&path);
        assert!(backend.load().is_empty());
    }

    #[test]
    fn test_reads_data_written_by_browser_client() {
        let raw = r#"[{"id":"6c1f","username":"C110152301","password":"secret","label":"me"},
                      {"id":"9a2b","username":"C110152302","password":"secret2"}]"#;
        let accounts = MemoryBackend::with_raw(raw).load();

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].label.as_deref(), Some("me"));
        assert_eq!(accounts[1].label, None);
    }

    #[test]
    fn test_memory_backend_wrong_shape_reads_empty() {
        assert!(MemoryBackend::with_raw(r#"{"id":"x"}"#).load().is_empty());
        assert!(MemoryBackend::with_raw("null").load().is_empty());
    }

    #[test]
    fn test_memory_backend_failing_writes() {
        let backend = MemoryBackend::new();
        backend.set_fail_writes(true);
        assert!(matches!(backend.save(&sample()), Err(StoreError::Io(_))));
        assert_eq!(backend.raw(), None);
    }
}
