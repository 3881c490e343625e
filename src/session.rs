//! Check-in form state and what a submit should do with it

use crate::account::{Account, AccountId, AccountStore};
use crate::error::RollcallError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitPlan {
    /// No saved accounts: check in with the typed-in credentials
    Manual {
        username: String,
        password: String,
        goto: String,
    },
    /// Check in every selected saved account
    Batch { accounts: Vec<Account>, goto: String },
}

#[derive(Debug, Clone, Default)]
pub struct CheckInForm {
    pub username: String,
    pub password: String,
    pub goto: String,
    selected: Vec<AccountId>,
}

impl CheckInForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    pub fn select(&mut self, id: &str) {
        if !self.is_selected(id) {
            self.selected.push(id.to_string());
        }
    }

    pub fn deselect(&mut self, id: &str) {
        self.selected.retain(|s| s != id);
    }

    /// Flip selection, returning the new state
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.is_selected(id) {
            self.deselect(id);
            false
        } else {
            self.select(id);
            true
        }
    }

    pub fn select_all(&mut self, store: &AccountStore) {
        for account in store.accounts() {
            self.select(&account.id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Drop selections whose account no longer exists
    pub fn retain_existing(&mut self, store: &AccountStore) {
        self.selected.retain(|id| store.get(id).is_some());
    }

    /// Selected accounts in store order
    pub fn selected_accounts(&self, store: &AccountStore) -> Vec<Account> {
        store
            .accounts()
            .iter()
            .filter(|a| self.is_selected(&a.id))
            .cloned()
            .collect()
    }

    /// Decide what submitting now would do.
    ///
    /// With no saved accounts the manual fields are used. With saved accounts
    /// at least one has to be selected; the manual fields are not a fallback.
    pub fn plan(&self, store: &AccountStore) -> Result<SubmitPlan, RollcallError> {
        let goto = self.goto.trim();

        if store.is_empty() {
            if self.username.trim().is_empty() || self.password.is_empty() {
                return Err(RollcallError::MissingCredentials);
            }
            if goto.is_empty() {
                return Err(RollcallError::MissingGoto);
            }
            return Ok(SubmitPlan::Manual {
                username: self.username.trim().to_string(),
                password: self.password.clone(),
                goto: goto.to_string(),
            });
        }

        let accounts = self.selected_accounts(store);
        if accounts.is_empty() {
            return Err(RollcallError::NoAccountsSelected);
        }
        if goto.is_empty() {
            return Err(RollcallError::MissingGoto);
        }
        Ok(SubmitPlan::Batch {
            accounts,
            goto: goto.to_string(),
        })
    }
}
