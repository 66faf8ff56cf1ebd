//! Asset-tracking chaincode executed against an in-process world state.

use std::collections::{BTreeMap, HashMap};

use ledger_protocol::Asset;

/// Committed key/value state plus every committed version of each key.
#[derive(Debug, Default)]
pub(crate) struct WorldState {
	state: BTreeMap<String, Vec<u8>>,
	history: HashMap<String, Vec<Vec<u8>>>,
}

impl WorldState {
	/// Applies a write set produced by a submitted transaction.
	pub(crate) fn commit(&mut self, writes: BTreeMap<String, Vec<u8>>) {
		for (key, value) in writes {
			self.history.entry(key.clone()).or_default().push(value.clone());
			self.state.insert(key, value);
		}
	}

	#[cfg(test)]
	pub(crate) fn len(&self) -> usize {
		self.state.len()
	}
}

/// Transaction context: reads see the transaction's own writes, range and
/// history queries see committed state only.
pub(crate) struct Stub<'a> {
	committed: &'a WorldState,
	writes: BTreeMap<String, Vec<u8>>,
}

impl<'a> Stub<'a> {
	pub(crate) fn new(committed: &'a WorldState) -> Self {
		Self {
			committed,
			writes: BTreeMap::new(),
		}
	}

	fn get_state(&self, key: &str) -> Option<&[u8]> {
		self.writes
			.get(key)
			.or_else(|| self.committed.state.get(key))
			.map(Vec::as_slice)
	}

	fn put_state(&mut self, key: &str, value: Vec<u8>) {
		self.writes.insert(key.to_string(), value);
	}

	fn state_by_range(&self) -> impl Iterator<Item = &[u8]> {
		self.committed.state.values().map(Vec::as_slice)
	}

	fn history_for_key(&self, key: &str) -> impl Iterator<Item = &[u8]> {
		self.committed
			.history
			.get(key)
			.into_iter()
			.flatten()
			.map(Vec::as_slice)
	}

	pub(crate) fn into_writes(self) -> BTreeMap<String, Vec<u8>> {
		self.writes
	}
}

type ChaincodeResult<T> = std::result::Result<T, String>;

/// Runs `function` with `args`, returning the marshalled response.
pub(crate) fn invoke(stub: &mut Stub<'_>, function: &str, args: &[String]) -> ChaincodeResult<Vec<u8>> {
	match function {
		"CreateAsset" => {
			let [id, dealer_id, msisdn, mpin, balance, status, trans_amount, trans_type, remarks] = arity::<9>(args)?;
			let asset = Asset {
				dealer_id: dealer_id.clone(),
				msisdn: msisdn.clone(),
				mpin: mpin.clone(),
				balance: int_param(4, balance)?,
				status: status.clone(),
				trans_amount: int_param(6, trans_amount)?,
				trans_type: trans_type.clone(),
				remarks: remarks.clone(),
			};
			create_asset(stub, id, &asset)?;
			Ok(Vec::new())
		}
		"ReadAsset" => {
			let [id] = arity::<1>(args)?;
			marshal(&read_asset(stub, id)?)
		}
		"UpdateAsset" => {
			let [id, balance, status, trans_type, remarks, trans_amount] = arity::<6>(args)?;
			let balance = int_param(1, balance)?;
			let trans_amount = int_param(5, trans_amount)?;
			let mut asset = read_asset(stub, id)?;
			asset.balance = balance;
			asset.status = status.clone();
			asset.trans_amount = trans_amount;
			asset.trans_type = trans_type.clone();
			asset.remarks = remarks.clone();
			stub.put_state(id, marshal(&asset)?);
			Ok(Vec::new())
		}
		"GetAllAssets" => {
			arity::<0>(args)?;
			let assets = stub.state_by_range().map(unmarshal).collect::<ChaincodeResult<Vec<_>>>()?;
			marshal_list(&assets)
		}
		"GetAssetHistory" => {
			let [id] = arity::<1>(args)?;
			let history = stub
				.history_for_key(id)
				.filter(|value| !value.is_empty())
				.map(unmarshal)
				.collect::<ChaincodeResult<Vec<_>>>()?;
			marshal_list(&history)
		}
		"AssetExists" => {
			let [id] = arity::<1>(args)?;
			Ok(stub.get_state(id).is_some().to_string().into_bytes())
		}
		other => Err(format!("Function {other} not found in contract AssetTracker")),
	}
}

fn create_asset(stub: &mut Stub<'_>, id: &str, asset: &Asset) -> ChaincodeResult<()> {
	if stub.get_state(id).is_some() {
		return Err(format!("the asset {id} already exists"));
	}
	stub.put_state(id, marshal(asset)?);
	Ok(())
}

fn read_asset(stub: &Stub<'_>, id: &str) -> ChaincodeResult<Asset> {
	let raw = stub.get_state(id).ok_or_else(|| format!("asset {id} does not exist"))?;
	unmarshal(raw)
}

fn arity<const N: usize>(args: &[String]) -> ChaincodeResult<&[String; N]> {
	args.try_into()
		.map_err(|_| format!("Incorrect number of params. Expected {N}, received {}", args.len()))
}

fn int_param(index: usize, value: &str) -> ChaincodeResult<i64> {
	value
		.parse()
		.map_err(|_| format!("Error managing parameter param{index}. Cannot convert passed value {value} to int"))
}

fn marshal(asset: &Asset) -> ChaincodeResult<Vec<u8>> {
	serde_json::to_vec(asset).map_err(|e| e.to_string())
}

/// An empty list marshals to `null`.
fn marshal_list(assets: &[Asset]) -> ChaincodeResult<Vec<u8>> {
	if assets.is_empty() {
		return Ok(b"null".to_vec());
	}
	serde_json::to_vec(assets).map_err(|e| e.to_string())
}

fn unmarshal(raw: &[u8]) -> ChaincodeResult<Asset> {
	serde_json::from_slice(raw).map_err(|e| e.to_string())
}
