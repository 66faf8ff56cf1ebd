//! Loading and host rewriting of the network connection profile.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use ledger_protocol::NetworkProfile;
use tracing::debug;

use crate::error::{Error, Result};

/// Reads and parses the connection profile at `path`.
///
/// # Errors
///
/// Returns [`Error::ProfileNotFound`] when the file does not exist,
/// [`Error::ProfileRead`] for other I/O failures, and
/// [`Error::ProfileParse`] when the content is not a profile document.
pub async fn load_profile(path: &Path) -> Result<NetworkProfile> {
	let raw = match tokio::fs::read_to_string(path).await {
		Ok(raw) => raw,
		Err(err) if err.kind() == ErrorKind::NotFound => {
			return Err(Error::ProfileNotFound { path: path.to_path_buf() });
		}
		Err(err) => {
			return Err(Error::ProfileRead {
				path: path.to_path_buf(),
				source: Arc::new(err),
			});
		}
	};

	serde_json::from_str(&raw).map_err(|err| Error::ProfileParse {
		path: path.to_path_buf(),
		source: Arc::new(err),
	})
}

/// Replaces the first `localhost` in every peer, CA and orderer URL with
/// `host`. `None` leaves the profile untouched, as does a `url` that is not
/// a string.
///
/// This is a plain substring replacement, not a URL parse: a host named
/// `localhost-backup` becomes `<host>-backup`. Deployment configuration
/// controls which hostnames appear in profiles, so this is accepted.
pub fn rewrite_host(profile: &mut NetworkProfile, host: Option<&str>) {
	let Some(host) = host else {
		return;
	};

	for endpoint in profile.endpoints_mut() {
		if let Some(url) = endpoint.url_mut() {
			let rewritten = url.replacen("localhost", host, 1);
			if rewritten != *url {
				debug!(target = "ledger.profile", from = %url, to = %rewritten, "rewrote endpoint host");
				*url = rewritten;
			}
		}
	}
}
