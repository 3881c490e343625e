//! Account storage and management

use tracing::{debug, info};

use super::backend::AccountBackend;
use super::types::{Account, AccountUpdate};
use crate::error::StoreError;

/// Ordered list of saved accounts, mirrored to a backend on every change.
///
/// Each mutation builds the new list, hands it to the backend and only then
/// replaces the in-memory copy, so a failed save leaves both sides as they
/// were.
pub struct AccountStore {
    accounts: Vec<Account>,
    backend: Box<dyn AccountBackend>,
}

impl AccountStore {
    /// Open the store, reading whatever the backend holds.
    pub fn open(backend: impl AccountBackend + 'static) -> Self {
        let accounts = backend.load();
        info!("Loaded {} saved account(s)", accounts.len());
        Self {
            accounts,
            backend: Box::new(backend),
        }
    }

    /// Create a new account and persist it
    pub fn add(
        &mut self,
        username: String,
        password: String,
        label: Option<String>,
    ) -> Result<Account, StoreError> {
        let account = Account::new(username, password, label);

        let mut next = self.accounts.clone();
        next.push(account.clone());
        self.commit(next)?;

        debug!("Added account {} ({})", account.id, account.display_label());
        Ok(account)
    }

    /// Merge `update` into the account with `id`. Unknown ids are a no-op.
    pub fn update(&mut self, id: &str, update: AccountUpdate) -> Result<(), StoreError> {
        let Some(index) = self.position(id) else {
            debug!("Update for unknown account {} ignored", id);
            return Ok(());
        };

        let mut next = self.accounts.clone();
        next[index].apply(update);
        self.commit(next)
    }

    /// Remove the account with `id` if present
    pub fn remove(&mut self, id: &str) -> Result<(), StoreError> {
        let next: Vec<Account> = self
            .accounts
            .iter()
            .filter(|a| a.id != id)
            .cloned()
            .collect();
        // Still persisted when nothing matched, so a corrupt slot gets rewritten
        if next.len() == self.accounts.len() {
            debug!("Remove for unknown account {}", id);
        }
        self.commit(next)
    }

    /// Remove every account
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.commit(Vec::new())
    }

    pub fn get(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.accounts.iter().position(|a| a.id == id)
    }

    fn commit(&mut self, next: Vec<Account>) -> Result<(), StoreError> {
        self.backend.save(&next)?;
        self.accounts = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::backend::{JsonFileBackend, MemoryBackend};

    #[test]
    fn test_add_then_reload() {
        let backend = MemoryBackend::new();
        let mut store = AccountStore::open(backend.clone());

        let first = store
            .add("C110152301".into(), "pw".into(), Some("Alice".into()))
            .unwrap();
        let second = store.add("C110152301".into(), "pw".into(), None).unwrap();

        assert!(!first.id.is_empty());
        assert_ne!(first.id, second.id);

        let reopened = AccountStore::open(backend);
        assert_eq!(reopened.accounts(), &[first.clone(), second]);
        assert_eq!(reopened.get(&first.id), Some(&first));
    }

    #[test]
    fn test_update_merges_and_persists() {
        let backend = MemoryBackend::new();
        let mut store = AccountStore::open(backend.clone());
        let account = store.add("u1".into(), "p1".into(), Some("Alice".into())).unwrap();

        store
            .update(
                &account.id,
                AccountUpdate {
                    username: Some("u2".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        let reopened = AccountStore::open(backend);
        let stored = reopened.get(&account.id).unwrap();
        assert_eq!(stored.username, "u2");
        assert_eq!(stored.password, "p1");
        assert_eq!(stored.label.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let backend = MemoryBackend::new();
        let mut store = AccountStore::open(backend.clone());
        store.add("u1".into(), "p1".into(), None).unwrap();
        let before = backend.raw();

        store
            .update(
                "no-such-id",
                AccountUpdate {
                    password: Some("x".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.accounts()[0].password, "p1");
        assert_eq!(backend.raw(), before);
    }

    #[test]
    fn test_remove_then_clear_leaves_empty_slot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        let mut store = AccountStore::open(JsonFileBackend::new(&path));

        let a = store.add("u1".into(), "p1".into(), None).unwrap();
        store.add("u2".into(), "p2".into(), None).unwrap();

        store.remove(&a.id).unwrap();
        assert_eq!(store.len(), 1);
        store.remove("missing").unwrap();
        assert_eq!(store.len(), 1);

        store.clear().unwrap();
        assert!(store.is_empty());

        let persisted: Vec<Account> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(persisted.is_empty());
        assert!(AccountStore::open(JsonFileBackend::new(&path)).is_empty());
    }

    #[test]
    fn test_corrupt_slot_opens_empty_and_recovers() {
        let backend = MemoryBackend::with_raw("<<garbage>>");
        let mut store = AccountStore::open(backend.clone());
        assert!(store.is_empty());

        store.add("u1".into(), "p1".into(), None).unwrap();
        assert_eq!(AccountStore::open(backend).len(), 1);
    }

    #[test]
    fn test_remove_unknown_id_rewrites_corrupt_slot() {
        let backend = MemoryBackend::with_raw("<<garbage>>");
        let mut store = AccountStore::open(backend.clone());

        store.remove("missing").unwrap();

        assert!(store.is_empty());
        let persisted: Vec<Account> = serde_json::from_str(&backend.raw().unwrap()).unwrap();
        assert!(persisted.is_empty());
    }

    #[test]
    fn test_failed_save_keeps_memory_and_slot_equal() {
        let backend = MemoryBackend::new();
        let mut store = AccountStore::open(backend.clone());
        let kept = store.add("u1".into(), "p1".into(), None).unwrap();

        backend.set_fail_writes(true);
        assert!(store.add("u2".into(), "p2".into(), None).is_err());
        assert!(store.clear().is_err());

        assert_eq!(store.accounts(), &[kept]);
        assert_eq!(AccountStore::open(backend).accounts(), store.accounts());
    }
}
