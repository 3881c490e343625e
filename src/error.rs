use thiserror::Error;

/// Failure to write the account slot. Reads never fail; see `AccountBackend::load`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
}

#[derive(Error, Debug)]
pub enum RollcallError {
    #[error("Missing rollcall goto")]
    MissingGoto,
    #[error("No accounts selected")]
    NoAccountsSelected,
    #[error("Username and password are required")]
    MissingCredentials,
    #[error("HTTP client error: {0}")]
    Http(String),
}
