pub mod error;
pub mod config;
pub mod account;
pub mod goto;
pub mod client;
pub mod batch;
pub mod scanner;
pub mod session;
pub mod interactive;
pub mod cli;
