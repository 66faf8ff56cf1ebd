//! Asset records and the HTTP request bodies that create and update them.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record stored by the asset-tracking chaincode.
///
/// Field names are upper-case on the wire, matching what the chaincode
/// marshals. The asset id is the world-state key and is not part of the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
	#[serde(rename = "DEALERID")]
	pub dealer_id: String,
	#[serde(rename = "MSISDN")]
	pub msisdn: String,
	#[serde(rename = "MPIN")]
	pub mpin: String,
	#[serde(rename = "BALANCE")]
	pub balance: i64,
	#[serde(rename = "STATUS")]
	pub status: String,
	#[serde(rename = "TRANSAMOUNT")]
	pub trans_amount: i64,
	#[serde(rename = "TRANSTYPE")]
	pub trans_type: String,
	#[serde(rename = "REMARKS")]
	pub remarks: String,
}

/// Body of `POST /assets`.
///
/// Every field is required by the chaincode but optional here, so an absent
/// field is reported while marshalling transaction arguments rather than as
/// a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAssetBody {
	#[serde(rename = "assetID")]
	pub asset_id: Option<String>,
	#[serde(rename = "dealerID")]
	pub dealer_id: Option<String>,
	pub msisdn: Option<String>,
	pub mpin: Option<String>,
	pub balance: Option<DecimalArg>,
	pub status: Option<String>,
	#[serde(rename = "transAmount")]
	pub trans_amount: Option<DecimalArg>,
	#[serde(rename = "transType")]
	pub trans_type: Option<String>,
	pub remarks: Option<String>,
}

/// Body of `PUT /assets/{assetID}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAssetBody {
	pub balance: Option<DecimalArg>,
	pub status: Option<String>,
	#[serde(rename = "transType")]
	pub trans_type: Option<String>,
	pub remarks: Option<String>,
	#[serde(rename = "transAmount")]
	pub trans_amount: Option<DecimalArg>,
}

/// A numeric argument in decimal-string form.
///
/// Accepts a JSON number, string or bool and keeps its textual rendering;
/// the chaincode does the integer parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalArg(String);

impl DecimalArg {
	pub fn into_string(self) -> String {
		self.0
	}
}

impl<'de> Deserialize<'de> for DecimalArg {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		match Value::deserialize(deserializer)? {
			Value::Number(n) => Ok(Self(n.to_string())),
			Value::String(s) => Ok(Self(s)),
			Value::Bool(b) => Ok(Self(b.to_string())),
			other => Err(de::Error::custom(format!(
				"expected a number or numeric string, found {other}"
			))),
		}
	}
}
