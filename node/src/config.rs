//! Orchestrator configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use govctl_types::Address;
use govctl_wallet_core::Signer;

use crate::logging::LogFormat;
use crate::OrchestratorError;

/// Everything a govctl flow needs, resolved once at start-up.
///
/// Can be loaded from a TOML file via [`OrchestratorConfig::from_toml_file`]
/// and then overridden field by field (the CLI layers flags and environment
/// variables on top). Components receive it by reference; none of them read
/// the process environment.
#[derive(Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// JSON-RPC endpoint of the node.
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// Deployed Governor contract.
    #[serde(default)]
    pub governor: Option<Address>,

    /// Deployed ERC20Votes token.
    #[serde(default)]
    pub token: Option<Address>,

    /// Hex private key of the signing account.
    #[serde(default)]
    pub private_key: Option<String>,

    /// Encrypted keystore of the signing account; used when no private key is set.
    #[serde(default)]
    pub keystore_path: Option<PathBuf>,

    #[serde(default)]
    pub keystore_password: Option<String>,

    /// Average block interval used for the remaining-time estimate.
    #[serde(default = "default_block_time_secs")]
    pub block_time_secs: u64,

    /// How often the receipt is polled while waiting for confirmation.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Blocks (inclusion block counted) before a transaction is confirmed.
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,

    /// Fixed gas limit; estimated per transaction when absent.
    #[serde(default)]
    pub gas_limit: Option<u64>,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// How the signing account is unlocked.
#[derive(Clone)]
pub enum Credential {
    PrivateKey(String),
    Keystore { path: PathBuf, password: String },
}

impl Credential {
    pub fn load_signer(&self) -> Result<Signer, OrchestratorError> {
        match self {
            Self::PrivateKey(key) => Signer::from_private_key(key)
                .map_err(|e| OrchestratorError::Configuration(format!("invalid private key: {e}"))),
            Self::Keystore { path, password } => Signer::from_keystore(path, password)
                .map_err(|e| {
                    OrchestratorError::Configuration(format!(
                        "cannot unlock keystore {}: {e}",
                        path.display()
                    ))
                }),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrivateKey(_) => f.write_str("PrivateKey(<redacted>)"),
            Self::Keystore { path, .. } => f
                .debug_struct("Keystore")
                .field("path", path)
                .finish_non_exhaustive(),
        }
    }
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_block_time_secs() -> u64 {
    12
}

fn default_poll_interval_secs() -> u64 {
    4
}

fn default_confirmations() -> u64 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl OrchestratorConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, OrchestratorError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OrchestratorError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, OrchestratorError> {
        toml::from_str(s).map_err(|e| OrchestratorError::Configuration(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, OrchestratorError> {
        toml::to_string_pretty(self).map_err(|e| OrchestratorError::Configuration(e.to_string()))
    }

    pub fn block_interval(&self) -> Duration {
        Duration::from_secs(self.block_time_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Reject values no flow can work with.
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        if self.confirmations == 0 {
            return Err(OrchestratorError::Configuration(
                "confirmations must be at least 1".into(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(OrchestratorError::Configuration(
                "poll_interval_secs must be at least 1".into(),
            ));
        }
        if self.gas_limit == Some(0) {
            return Err(OrchestratorError::Configuration(
                "gas_limit must be positive when set".into(),
            ));
        }
        Ok(())
    }

    pub fn require_rpc_url(&self) -> Result<&str, OrchestratorError> {
        match self.rpc_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(missing("RPC_URL", "node endpoint")),
        }
    }

    pub fn require_governor(&self) -> Result<Address, OrchestratorError> {
        require_address(self.governor, "GOVERNOR_ADDRESS", "governor")
    }

    pub fn require_token(&self) -> Result<Address, OrchestratorError> {
        require_address(self.token, "TOKEN_ADDRESS", "token")
    }

    /// The signing credential. A private key wins over a keystore.
    pub fn require_credential(&self) -> Result<Credential, OrchestratorError> {
        if let Some(key) = self.private_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(Credential::PrivateKey(key.trim().to_string()));
        }
        match (&self.keystore_path, &self.keystore_password) {
            (Some(path), Some(password)) => Ok(Credential::Keystore {
                path: path.clone(),
                password: password.clone(),
            }),
            (Some(_), None) => Err(missing("KEYSTORE_PASSWORD", "keystore password")),
            _ => Err(missing("PRIVATE_KEY", "signing credential")),
        }
    }
}

fn missing(var: &str, what: &str) -> OrchestratorError {
    OrchestratorError::Configuration(format!("{what} not configured (set {var})"))
}

fn require_address(
    address: Option<Address>,
    var: &str,
    what: &str,
) -> Result<Address, OrchestratorError> {
    match address {
        Some(addr) if addr != Address::ZERO => Ok(addr),
        Some(_) => Err(OrchestratorError::Configuration(format!(
            "{what} address is the zero address ({var})"
        ))),
        None => Err(missing(var, &format!("{what} address"))),
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            governor: None,
            token: None,
            private_key: None,
            keystore_path: None,
            keystore_password: None,
            block_time_secs: default_block_time_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            confirmations: default_confirmations(),
            gas_limit: None,
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

impl fmt::Debug for OrchestratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrchestratorConfig")
            .field("rpc_url", &self.rpc_url)
            .field("governor", &self.governor)
            .field("token", &self.token)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("keystore_path", &self.keystore_path)
            .field("block_time_secs", &self.block_time_secs)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("confirmations", &self.confirmations)
            .field("gas_limit", &self.gas_limit)
            .field("log_format", &self.log_format)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}
