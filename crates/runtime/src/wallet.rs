//! File-system wallet: one `<label>.id` JSON file per enrolled identity.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ledger_protocol::Identity;

use crate::error::{Error, Result};
use crate::gateway::IdentityStore;

const IDENTITY_FILE_EXTENSION: &str = "id";

/// Wallet rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileSystemWallet {
	root: PathBuf,
}

impl FileSystemWallet {
	/// Opens the wallet, creating the directory when it does not exist yet.
	pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
		let root = root.into();
		tokio::fs::create_dir_all(&root).await.map_err(|err| Error::Wallet {
			path: root.clone(),
			message: err.to_string(),
		})?;
		Ok(Self { root })
	}

	pub fn path(&self) -> &Path {
		&self.root
	}

	fn identity_path(&self, label: &str) -> PathBuf {
		self.root.join(format!("{label}.{IDENTITY_FILE_EXTENSION}"))
	}

	/// Stores `identity` under `label`, replacing any previous entry.
	#[cfg(test)]
	pub(crate) async fn put(&self, label: &str, identity: &Identity) -> Result<()> {
		let path = self.identity_path(label);
		let json = serde_json::to_vec_pretty(identity)?;
		tokio::fs::write(&path, json).await.map_err(|err| Error::Wallet {
			path,
			message: err.to_string(),
		})
	}
}

#[async_trait]
impl IdentityStore for FileSystemWallet {
	async fn get(&self, label: &str) -> Result<Option<Identity>> {
		let path = self.identity_path(label);
		let raw = match tokio::fs::read(&path).await {
			Ok(raw) => raw,
			Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
			Err(err) => {
				return Err(Error::Wallet {
					path,
					message: err.to_string(),
				});
			}
		};

		serde_json::from_slice(&raw).map(Some).map_err(|err| Error::Wallet {
			path,
			message: format!("invalid identity file: {err}"),
		})
	}
}
