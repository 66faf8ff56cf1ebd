//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Failure of a route handler. Every variant is answered with
/// `500 {"error": message}`.
#[derive(Debug, Error)]
pub enum ApiError {
	/// A field the chaincode needs was absent from the request body.
	#[error("missing required field \"{0}\"")]
	MissingField(&'static str),

	#[error(transparent)]
	Ledger(#[from] ledger_runtime::Error),
}

impl ApiError {
	/// Whether an operator has to provision something (an identity, a
	/// profile) before the request can succeed.
	fn needs_operator(&self) -> bool {
		match self {
			ApiError::MissingField(_) => false,
			ApiError::Ledger(err) => err.is_user_actionable(),
		}
	}

	fn is_ledger_unreachable(&self) -> bool {
		matches!(self, ApiError::Ledger(err) if err.is_connection_failure())
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let message = self.to_string();
		if self.needs_operator() {
			warn!(target = "ledger.api", error = %message, "request failed; ledger setup incomplete");
		} else if self.is_ledger_unreachable() {
			error!(target = "ledger.api", error = %message, "request failed; ledger unreachable");
		} else {
			error!(target = "ledger.api", error = %message, "request failed");
		}
		(StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message }))).into_response()
	}
}
