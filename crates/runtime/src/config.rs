//! Connection configuration resolved from the process environment.
//!
//! Every parameter has a default, so an empty environment resolves to a
//! configuration that targets the local test network. Empty variables are
//! treated as unset.
//!
//! | variable | default |
//! |----------|---------|
//! | `CCP_PATH` | `connection/connection-org1.json` |
//! | `CHANNEL_NAME` | `mychannel` |
//! | `CHAINCODE_NAME` | `assettrack` |
//! | `DISCOVERY_ENABLED` | `true` |
//! | `AS_LOCALHOST` | `true` |
//! | `APP_IDENTITY` | `appUser` |
//! | `WALLET_PATH` | `connection/wallet` |
//! | `FABRIC_HOST` | `localhost` (no rewrite) |

use std::path::PathBuf;

pub const CCP_PATH_VAR: &str = "CCP_PATH";
pub const CHANNEL_NAME_VAR: &str = "CHANNEL_NAME";
pub const CHAINCODE_NAME_VAR: &str = "CHAINCODE_NAME";
pub const DISCOVERY_ENABLED_VAR: &str = "DISCOVERY_ENABLED";
pub const AS_LOCALHOST_VAR: &str = "AS_LOCALHOST";
pub const APP_IDENTITY_VAR: &str = "APP_IDENTITY";
pub const WALLET_PATH_VAR: &str = "WALLET_PATH";
pub const FABRIC_HOST_VAR: &str = "FABRIC_HOST";

pub const DEFAULT_PROFILE_PATH: &str = "connection/connection-org1.json";
pub const DEFAULT_CHANNEL: &str = "mychannel";
pub const DEFAULT_CHAINCODE: &str = "assettrack";
pub const DEFAULT_IDENTITY: &str = "appUser";
pub const DEFAULT_WALLET_PATH: &str = "connection/wallet";

/// Host override value meaning "leave endpoint URLs as they are".
pub const NO_HOST_OVERRIDE: &str = "localhost";

/// Parameters for one connection attempt. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
	pub profile_path: PathBuf,
	pub channel: String,
	pub chaincode: String,
	/// Wallet label of the identity used to connect.
	pub identity: String,
	pub wallet_path: PathBuf,
	pub discovery_enabled: bool,
	pub as_localhost: bool,
	/// Host substituted for `localhost` in profile URLs, or [`NO_HOST_OVERRIDE`].
	pub host_override: String,
}

impl Default for ConnectionConfig {
	fn default() -> Self {
		Self::from_lookup(|_| None)
	}
}

impl ConnectionConfig {
	/// Resolves the configuration from the current process environment.
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Resolves the configuration from an arbitrary variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |key: &str| lookup(key).filter(|value| !value.is_empty());
		let flag = |key: &str| var(key).is_none_or(|value| value.eq_ignore_ascii_case("true"));

		Self {
			profile_path: var(CCP_PATH_VAR).map_or_else(|| PathBuf::from(DEFAULT_PROFILE_PATH), PathBuf::from),
			channel: var(CHANNEL_NAME_VAR).unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
			chaincode: var(CHAINCODE_NAME_VAR).unwrap_or_else(|| DEFAULT_CHAINCODE.to_string()),
			identity: var(APP_IDENTITY_VAR).unwrap_or_else(|| DEFAULT_IDENTITY.to_string()),
			wallet_path: var(WALLET_PATH_VAR).map_or_else(|| PathBuf::from(DEFAULT_WALLET_PATH), PathBuf::from),
			discovery_enabled: flag(DISCOVERY_ENABLED_VAR),
			as_localhost: flag(AS_LOCALHOST_VAR),
			host_override: var(FABRIC_HOST_VAR).unwrap_or_else(|| NO_HOST_OVERRIDE.to_string()),
		}
	}

	/// Returns the override host when one is configured.
	pub fn host_override(&self) -> Option<&str> {
		(self.host_override != NO_HOST_OVERRIDE).then_some(self.host_override.as_str())
	}
}

/// Source of [`ConnectionConfig`] for each connection attempt.
pub trait ConfigResolver: Send + Sync {
	fn resolve(&self) -> ConnectionConfig;
}

/// Resolves from the process environment at the time of each attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ConfigResolver for ProcessEnv {
	fn resolve(&self) -> ConnectionConfig {
		ConnectionConfig::from_env()
	}
}

/// A fixed configuration resolves to itself.
impl ConfigResolver for ConnectionConfig {
	fn resolve(&self) -> ConnectionConfig {
		self.clone()
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn resolve(vars: &[(&str, &str)]) -> ConnectionConfig {
		let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		ConnectionConfig::from_lookup(|key| vars.get(key).cloned())
	}

	#[test]
	fn empty_environment_uses_defaults() {
		let config = resolve(&[]);
		assert_eq!(config.profile_path, PathBuf::from(DEFAULT_PROFILE_PATH));
		assert_eq!(config.channel, "mychannel");
		assert_eq!(config.chaincode, "assettrack");
		assert_eq!(config.identity, "appUser");
		assert_eq!(config.wallet_path, PathBuf::from(DEFAULT_WALLET_PATH));
		assert!(config.discovery_enabled);
		assert!(config.as_localhost);
		assert_eq!(config.host_override, NO_HOST_OVERRIDE);
		assert_eq!(config.host_override(), None);
		assert_eq!(config, ConnectionConfig::default());
	}

	#[test]
	fn variables_override_defaults() {
		let config = resolve(&[
			(CCP_PATH_VAR, "/etc/ledger/ccp.json"),
			(CHANNEL_NAME_VAR, "payments"),
			(CHAINCODE_NAME_VAR, "ledgercc"),
			(APP_IDENTITY_VAR, "svc"),
			(WALLET_PATH_VAR, "/var/lib/wallet"),
			(FABRIC_HOST_VAR, "peer0.example.com"),
		]);
		assert_eq!(config.profile_path, PathBuf::from("/etc/ledger/ccp.json"));
		assert_eq!(config.channel, "payments");
		assert_eq!(config.chaincode, "ledgercc");
		assert_eq!(config.identity, "svc");
		assert_eq!(config.wallet_path, PathBuf::from("/var/lib/wallet"));
		assert_eq!(config.host_override(), Some("peer0.example.com"));
	}

	#[test]
	fn flags_are_true_only_for_true() {
		assert!(resolve(&[(DISCOVERY_ENABLED_VAR, "TRUE")]).discovery_enabled);
		assert!(!resolve(&[(DISCOVERY_ENABLED_VAR, "false")]).discovery_enabled);
		assert!(!resolve(&[(AS_LOCALHOST_VAR, "1")]).as_localhost);
		assert!(!resolve(&[(AS_LOCALHOST_VAR, "yes")]).as_localhost);
	}

	#[test]
	fn empty_values_fall_back_to_defaults() {
		let config = resolve(&[(CHANNEL_NAME_VAR, ""), (AS_LOCALHOST_VAR, ""), (FABRIC_HOST_VAR, "")]);
		assert_eq!(config.channel, DEFAULT_CHANNEL);
		assert!(config.as_localhost);
		assert_eq!(config.host_override(), None);
	}
}
