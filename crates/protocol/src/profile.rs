//! Connection profile document.
//!
//! Only the endpoint sections are typed. Every other key (organizations,
//! channels, TLS material, grpc options) is carried through untouched so a
//! profile can be rewritten and handed on without losing information.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parsed network connection profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkProfile {
	/// Peer name to peer descriptor.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub peers: Option<BTreeMap<String, EndpointDescriptor>>,
	/// CA name to CA descriptor.
	#[serde(
		rename = "certificateAuthorities",
		default,
		skip_serializing_if = "Option::is_none"
	)]
	pub certificate_authorities: Option<BTreeMap<String, EndpointDescriptor>>,
	/// Orderer name to orderer descriptor.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub orderers: Option<BTreeMap<String, EndpointDescriptor>>,
	/// Remaining top-level keys.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// A peer, CA or orderer entry.
///
/// Held as the raw JSON object so every key survives a rewrite unchanged,
/// including a `url` that is `null` or not a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointDescriptor(Map<String, Value>);

impl EndpointDescriptor {
	pub fn with_url(url: impl Into<String>) -> Self {
		let mut fields = Map::new();
		fields.insert("url".to_string(), Value::String(url.into()));
		Self(fields)
	}

	/// The endpoint URL, when present as a string.
	pub fn url(&self) -> Option<&str> {
		self.0.get("url").and_then(Value::as_str)
	}

	/// Mutable access to a string URL. Any other `url` value is not exposed.
	pub fn url_mut(&mut self) -> Option<&mut String> {
		match self.0.get_mut("url") {
			Some(Value::String(url)) => Some(url),
			_ => None,
		}
	}
}

impl NetworkProfile {
	/// Mutable access to every descriptor in the peer, CA and orderer sections.
	pub fn endpoints_mut(&mut self) -> impl Iterator<Item = &mut EndpointDescriptor> {
		[
			self.peers.as_mut(),
			self.certificate_authorities.as_mut(),
			self.orderers.as_mut(),
		]
		.into_iter()
		.flatten()
		.flat_map(|section| section.values_mut())
	}

	/// Peers with a URL, in name order.
	pub fn peer_urls(&self) -> impl Iterator<Item = (&str, &str)> {
		self.peers
			.iter()
			.flat_map(|peers| peers.iter())
			.filter_map(|(name, peer)| peer.url().map(|url| (name.as_str(), url)))
	}
}
