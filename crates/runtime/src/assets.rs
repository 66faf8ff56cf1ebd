//! Typed façade over the asset-tracking chaincode.

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::gateway::TransactionHandle;

pub const CREATE_ASSET: &str = "CreateAsset";
pub const READ_ASSET: &str = "ReadAsset";
pub const UPDATE_ASSET: &str = "UpdateAsset";
pub const GET_ALL_ASSETS: &str = "GetAllAssets";
pub const GET_ASSET_HISTORY: &str = "GetAssetHistory";

/// Arguments of `CreateAsset`. Numeric fields are in decimal-string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAssetArgs {
	pub asset_id: String,
	pub dealer_id: String,
	pub msisdn: String,
	pub mpin: String,
	pub balance: String,
	pub status: String,
	pub trans_amount: String,
	pub trans_type: String,
	pub remarks: String,
}

impl CreateAssetArgs {
	fn into_arguments(self) -> Vec<String> {
		vec![
			self.asset_id,
			self.dealer_id,
			self.msisdn,
			self.mpin,
			self.balance,
			self.status,
			self.trans_amount,
			self.trans_type,
			self.remarks,
		]
	}
}

/// Arguments of `UpdateAsset` other than the asset id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAssetArgs {
	pub balance: String,
	pub status: String,
	pub trans_type: String,
	pub remarks: String,
	pub trans_amount: String,
}

impl UpdateAssetArgs {
	fn into_arguments(self, asset_id: &str) -> Vec<String> {
		vec![
			asset_id.to_string(),
			self.balance,
			self.status,
			self.trans_type,
			self.remarks,
			self.trans_amount,
		]
	}
}

/// Asset operations issued through a session's transaction handle.
///
/// Records are returned as the JSON the ledger produced, without
/// re-shaping.
#[derive(Clone)]
pub struct AssetContract {
	handle: TransactionHandle,
}

impl AssetContract {
	pub fn new(handle: TransactionHandle) -> Self {
		Self { handle }
	}

	async fn submit(&self, transaction: &'static str, args: &[String]) -> Result<Vec<u8>> {
		debug!(target = "ledger.assets", chaincode = self.handle.name(), transaction, "submit");
		self.handle.submit_transaction(transaction, args).await
	}

	async fn evaluate(&self, transaction: &'static str, args: &[String]) -> Result<Vec<u8>> {
		debug!(target = "ledger.assets", chaincode = self.handle.name(), transaction, "evaluate");
		self.handle.evaluate_transaction(transaction, args).await
	}

	pub async fn create(&self, args: CreateAssetArgs) -> Result<()> {
		self.submit(CREATE_ASSET, &args.into_arguments()).await.map(drop)
	}

	pub async fn read(&self, asset_id: &str) -> Result<Value> {
		let payload = self.evaluate(READ_ASSET, &[asset_id.to_string()]).await?;
		serde_json::from_slice(&payload).map_err(|e| Error::ResponseParse(format!("{READ_ASSET}: {e}")))
	}

	pub async fn update(&self, asset_id: &str, args: UpdateAssetArgs) -> Result<()> {
		self.submit(UPDATE_ASSET, &args.into_arguments(asset_id)).await.map(drop)
	}

	/// Lists every asset. Never fails on the payload shape; see
	/// [`normalize_asset_list`].
	pub async fn list(&self) -> Result<Vec<Value>> {
		let payload = self.evaluate(GET_ALL_ASSETS, &[]).await?;
		Ok(normalize_asset_list(&payload))
	}

	/// Every committed version of an asset, oldest first. An asset with no
	/// history yields an empty list.
	pub async fn history(&self, asset_id: &str) -> Result<Vec<Value>> {
		let payload = self.evaluate(GET_ASSET_HISTORY, &[asset_id.to_string()]).await?;

		match serde_json::from_slice::<Value>(&payload) {
			Ok(Value::Null) => Ok(Vec::new()),
			Ok(Value::Array(versions)) => Ok(versions),
			Ok(other) => Err(Error::ResponseParse(format!(
				"{GET_ASSET_HISTORY}: expected an array, found {other}"
			))),
			Err(e) => Err(Error::ResponseParse(format!("{GET_ASSET_HISTORY}: {e}"))),
		}
	}
}

/// Normalises a `GetAllAssets` payload.
///
/// The ledger answers an empty query with an empty payload or `null`; both,
/// and anything that is not a JSON array, become an empty list.
pub fn normalize_asset_list(payload: &[u8]) -> Vec<Value> {
	let text = String::from_utf8_lossy(payload);
	let text = text.trim();
	if text.is_empty() {
		return Vec::new();
	}

	match serde_json::from_str::<Value>(text) {
		Ok(Value::Array(assets)) => assets,
		Ok(_) => Vec::new(),
		Err(e) => {
			debug!(target = "ledger.assets", error = %e, "unparseable asset list treated as empty");
			Vec::new()
		}
	}
}
