//! Asset routes. Each handler takes the session's transaction handle, runs
//! one chaincode call and serialises the result.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use ledger_protocol::{CreateAssetBody, DecimalArg, UpdateAssetBody};
use ledger_runtime::{AssetContract, CreateAssetArgs, SessionManager, UpdateAssetArgs};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::ApiError;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Builds the asset API around a shared session manager.
pub fn router(sessions: SessionManager) -> Router {
	Router::new()
		.route("/assets", get(list_assets).post(create_asset))
		.route("/assets/{asset_id}", get(read_asset).put(update_asset))
		.route("/assets/{asset_id}/history", get(asset_history))
		.with_state(sessions)
}

/// Acknowledgement returned by create and update.
#[derive(Debug, Serialize)]
struct Ack {
	message: &'static str,
	#[serde(rename = "assetID")]
	asset_id: String,
}

async fn contract(sessions: &SessionManager) -> Result<AssetContract, ApiError> {
	Ok(AssetContract::new(sessions.handle().await?))
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ApiError> {
	value.ok_or(ApiError::MissingField(field))
}

fn decimal(value: Option<DecimalArg>, field: &'static str) -> Result<String, ApiError> {
	required(value, field).map(DecimalArg::into_string)
}

fn create_args(body: CreateAssetBody) -> Result<CreateAssetArgs, ApiError> {
	Ok(CreateAssetArgs {
		asset_id: required(body.asset_id, "assetID")?,
		dealer_id: required(body.dealer_id, "dealerID")?,
		msisdn: required(body.msisdn, "msisdn")?,
		mpin: required(body.mpin, "mpin")?,
		balance: decimal(body.balance, "balance")?,
		status: required(body.status, "status")?,
		trans_amount: decimal(body.trans_amount, "transAmount")?,
		trans_type: required(body.trans_type, "transType")?,
		remarks: required(body.remarks, "remarks")?,
	})
}

fn update_args(body: UpdateAssetBody) -> Result<UpdateAssetArgs, ApiError> {
	Ok(UpdateAssetArgs {
		balance: decimal(body.balance, "balance")?,
		status: required(body.status, "status")?,
		trans_type: required(body.trans_type, "transType")?,
		remarks: required(body.remarks, "remarks")?,
		trans_amount: decimal(body.trans_amount, "transAmount")?,
	})
}

#[instrument(name = "create_asset", skip_all)]
async fn create_asset(State(sessions): State<SessionManager>, Json(body): Json<CreateAssetBody>) -> ApiResult<Ack> {
	let args = create_args(body)?;
	let asset_id = args.asset_id.clone();

	contract(&sessions).await?.create(args).await?;
	info!(target = "ledger.api", asset_id = %asset_id, "asset created");

	Ok(Json(Ack {
		message: "Asset created successfully",
		asset_id,
	}))
}

#[instrument(name = "read_asset", skip_all, fields(asset_id = %asset_id))]
async fn read_asset(State(sessions): State<SessionManager>, Path(asset_id): Path<String>) -> ApiResult<Value> {
	Ok(Json(contract(&sessions).await?.read(&asset_id).await?))
}

#[instrument(name = "update_asset", skip_all, fields(asset_id = %asset_id))]
async fn update_asset(
	State(sessions): State<SessionManager>,
	Path(asset_id): Path<String>,
	Json(body): Json<UpdateAssetBody>,
) -> ApiResult<Ack> {
	let args = update_args(body)?;

	contract(&sessions).await?.update(&asset_id, args).await?;
	info!(target = "ledger.api", "asset updated");

	Ok(Json(Ack {
		message: "Asset updated successfully",
		asset_id,
	}))
}

#[instrument(name = "list_assets", skip_all)]
async fn list_assets(State(sessions): State<SessionManager>) -> ApiResult<Vec<Value>> {
	Ok(Json(contract(&sessions).await?.list().await?))
}

#[instrument(name = "asset_history", skip_all, fields(asset_id = %asset_id))]
async fn asset_history(State(sessions): State<SessionManager>, Path(asset_id): Path<String>) -> ApiResult<Vec<Value>> {
	Ok(Json(contract(&sessions).await?.history(&asset_id).await?))
}
