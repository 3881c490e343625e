use clap::Parser;

use crate::config::{RollcallConfig, DEFAULT_CONFIG_PATH};

/// Launch options. Everything else happens in the interactive menu.
#[derive(Parser, Debug)]
#[command(name = "nkust_rollcall")]
#[command(about = "NKUST rollcall check-in client", long_about = None)]
pub struct Cli {
    /// Config file (created with defaults if missing)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Base URL of the check-in backend, overrides config and ROLLCALL_API_URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Where saved accounts are kept, overrides config
    #[arg(long)]
    pub accounts_file: Option<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Config file, then environment, then flags.
    pub fn resolve_config(&self) -> RollcallConfig {
        let mut config = RollcallConfig::load_or_default(&self.config);
        config.apply_env();
        self.apply_overrides(&mut config);
        config
    }

    pub fn apply_overrides(&self, config: &mut RollcallConfig) {
        if let Some(url) = &self.api_url {
            config.apply_api_url(url);
        }
        if let Some(path) = &self.accounts_file {
            config.storage.accounts_file = path.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["nkust_rollcall"]);
        assert_eq!(cli.config, "rollcall.toml");
        assert_eq!(cli.log_level, "info");
        assert!(cli.api_url.is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "nkust_rollcall",
            "--api-url",
            "https://api.example.edu",
            "--accounts-file",
            "/tmp/accounts.json",
        ]);
        let mut config = RollcallConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.client.api_url, "https://api.example.edu");
        assert_eq!(config.storage.accounts_file, "/tmp/accounts.json");
    }
}
