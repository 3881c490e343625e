//! Account type definitions

use serde::{Deserialize, Serialize};

/// Account identifier - generated UUID string
pub type AccountId = String;

/// One saved credential set
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub password: String,
    /// Optional alias shown instead of the username
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Partial update for an account. `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    /// `Some(None)` clears the label
    pub label: Option<Option<String>>,
}

impl Account {
    /// Create a new account with a fresh id
    pub fn new(username: String, password: String, label: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            password,
            label: normalize_label(label),
        }
    }

    /// Label if set, username otherwise
    pub fn display_label(&self) -> &str {
        match self.label.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => &self.username,
        }
    }

    /// Merge the given fields, keeping the id and anything unspecified.
    pub fn apply(&mut self, update: AccountUpdate) {
        if let Some(username) = update.username {
            self.username = username;
        }
        if let Some(password) = update.password {
            self.password = password;
        }
        if let Some(label) = update.label {
            self.label = normalize_label(label);
        }
    }
}

impl AccountUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none() && self.label.is_none()
    }
}

// A blank alias is the same as no alias.
fn normalize_label(label: Option<String>) -> Option<String> {
    label.filter(|l| !l.trim().is_empty())
}
