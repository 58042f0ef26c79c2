//! Client configuration
//!
//! Loaded from TOML; every section and field has a default so a partial file
//! (or no file) is valid. Environment variables override file values.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Blocks kept by a live node: four epochs of 12 hours at one block per second
pub const DEFAULT_RETENTION_WINDOW_BLOCKS: u64 = 4 * 12 * 3600;

/// Gas attached to every function call: 30 Tgas
pub const DEFAULT_FUNCTION_CALL_GAS: u64 = 30_000_000_000_000;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Ledger network
    pub ledger: LedgerConfig,
    /// HTTP backends
    pub http: HttpConfig,
    /// Feature flags
    pub settings: Settings,
}

impl ClientConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With ledger section
    #[inline]
    #[must_use]
    pub fn with_ledger(mut self, ledger: LedgerConfig) -> Self {
        self.ledger = ledger;
        self
    }

    /// With HTTP section
    #[inline]
    #[must_use]
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// With feature flags
    #[inline]
    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// `TypesError::ConfigParse` on malformed TOML
    pub fn from_toml_str(text: &str) -> Result<Self, TypesError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML file and apply environment overrides
    ///
    /// # Errors
    /// - `TypesError::ConfigIo` if the file cannot be read
    /// - `TypesError::ConfigParse` on malformed TOML
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TypesError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TypesError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?.apply_env_overrides();
        tracing::debug!(path = %path.display(), network = %config.ledger.network_id, "Loaded config");
        Ok(config)
    }

    /// Apply `CHAINREQ_*` variables from the process environment
    #[must_use]
    pub fn apply_env_overrides(self) -> Self {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source
    #[must_use]
    pub fn apply_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let set = |target: &mut String, key: &str| {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *target = value;
            }
        };
        set(&mut self.ledger.network_id, "CHAINREQ_NEAR_NETWORK_ID");
        set(&mut self.ledger.node_url, "CHAINREQ_NEAR_NODE_URL");
        set(&mut self.ledger.archival_node_url, "CHAINREQ_NEAR_ARCHIVAL_NODE_URL");
        set(&mut self.ledger.contract_name, "CHAINREQ_NEAR_CONTRACT_NAME");
        set(&mut self.ledger.wallet_url, "CHAINREQ_NEAR_WALLET_URL");
        set(&mut self.http.host_name, "CHAINREQ_HTTP_HOST_NAME");
        if let Some(account) = lookup("CHAINREQ_NEAR_ACCOUNT_ID").filter(|v| !v.is_empty()) {
            self.ledger.account_id = Some(account);
        }
        self
    }
}

/// Ledger network parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Network name, also the credentials subdirectory
    pub network_id: String,
    /// Live RPC node
    pub node_url: String,
    /// Archival RPC node
    pub archival_node_url: String,
    /// Default contract
    pub contract_name: String,
    /// Wallet used for sign-in
    pub wallet_url: String,
    /// Signed-in account, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Blocks the live node retains before pruning
    pub retention_window_blocks: u64,
    /// Gas attached to function calls
    pub function_call_gas: u64,
    /// Key store directory; `~` expands to the home directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_dir: Option<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            network_id: "testnet".to_string(),
            node_url: "https://rpc.testnet.near.org".to_string(),
            archival_node_url: "https://rpc.testnet.internal.near.org".to_string(),
            contract_name: "dev-1652100430918-60749606761829".to_string(),
            wallet_url: "https://wallet.testnet.near.org".to_string(),
            account_id: None,
            retention_window_blocks: DEFAULT_RETENTION_WINDOW_BLOCKS,
            function_call_gas: DEFAULT_FUNCTION_CALL_GAS,
            credentials_dir: None,
        }
    }
}

impl LedgerConfig {
    /// With live node URL
    #[inline]
    #[must_use]
    pub fn with_node_url(mut self, url: impl Into<String>) -> Self {
        self.node_url = url.into();
        self
    }

    /// With archival node URL
    #[inline]
    #[must_use]
    pub fn with_archival_node_url(mut self, url: impl Into<String>) -> Self {
        self.archival_node_url = url.into();
        self
    }

    /// With signed-in account
    #[inline]
    #[must_use]
    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// With retention window
    #[inline]
    #[must_use]
    pub fn with_retention_window(mut self, blocks: u64) -> Self {
        self.retention_window_blocks = blocks;
        self
    }

    /// With function-call gas
    #[inline]
    #[must_use]
    pub fn with_function_call_gas(mut self, gas: u64) -> Self {
        self.function_call_gas = gas;
        self
    }

    /// Key store directory, `~/.near-credentials` when unset
    #[must_use]
    pub fn credentials_path(&self) -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        match self.credentials_dir.as_deref() {
            Some(dir) => match dir.strip_prefix("~/") {
                Some(rest) => home.join(rest),
                None if dir == "~" => home,
                None => PathBuf::from(dir),
            },
            None => home.join(".near-credentials"),
        }
    }
}

/// HTTP backend parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Application backend host
    pub host_name: String,
    /// Forwarding proxy
    pub proxy_url: String,
    /// Local intercepting agent
    pub agent_url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host_name: "https://near-fm-be.herokuapp.com/api".to_string(),
            proxy_url: "https://proxy.hoppscotch.io".to_string(),
            agent_url: "http://127.0.0.1:9119".to_string(),
            timeout_secs: 30,
        }
    }
}

impl HttpConfig {
    /// With proxy URL
    #[inline]
    #[must_use]
    pub fn with_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = url.into();
        self
    }

    /// With agent URL
    #[inline]
    #[must_use]
    pub fn with_agent_url(mut self, url: impl Into<String>) -> Self {
        self.agent_url = url.into();
        self
    }

    /// With timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Feature flags read on every strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Allow the intercepting extension when installed
    pub extensions_enabled: bool,
    /// Route HTTP calls through the forwarding proxy
    pub proxy_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            extensions_enabled: true,
            proxy_enabled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_match_network_constants() {
        let config = ClientConfig::default();
        assert_eq!(config.ledger.retention_window_blocks, 172_800);
        assert_eq!(config.ledger.function_call_gas, 30_000_000_000_000);
        assert_eq!(config.ledger.network_id, "testnet");
        assert!(config.settings.extensions_enabled);
        assert!(!config.settings.proxy_enabled);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
            [ledger]
            node_url = "http://localhost:3030"
            [settings]
            proxy_enabled = true
            "#,
        )
        .unwrap();
        assert_eq!(config.ledger.node_url, "http://localhost:3030");
        assert_eq!(config.ledger.network_id, "testnet");
        assert!(config.settings.proxy_enabled);
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            ClientConfig::from_toml_str("[ledger"),
            Err(TypesError::ConfigParse(_))
        ));
    }

    #[test]
    fn overrides_replace_non_empty_values() {
        let vars: HashMap<&str, &str> = [
            ("CHAINREQ_NEAR_NODE_URL", "http://override"),
            ("CHAINREQ_NEAR_NETWORK_ID", ""),
            ("CHAINREQ_NEAR_ACCOUNT_ID", "alice.testnet"),
        ]
        .into_iter()
        .collect();
        let config = ClientConfig::default()
            .apply_overrides_from(|k| vars.get(k).map(|v| (*v).to_string()));
        assert_eq!(config.ledger.node_url, "http://override");
        assert_eq!(config.ledger.network_id, "testnet");
        assert_eq!(config.ledger.account_id.as_deref(), Some("alice.testnet"));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http]\ntimeout_secs = 5").unwrap();
        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.http.timeout_secs, 5);

        assert!(matches!(
            ClientConfig::load("/definitely/not/here.toml"),
            Err(TypesError::ConfigIo { .. })
        ));
    }

    #[test]
    fn credentials_path_expands_home() {
        let mut ledger = LedgerConfig::default();
        ledger.credentials_dir = Some("/tmp/keys".into());
        assert_eq!(ledger.credentials_path(), PathBuf::from("/tmp/keys"));
        ledger.credentials_dir = Some("~/keys".into());
        assert!(ledger.credentials_path().ends_with("keys"));
    }
}
