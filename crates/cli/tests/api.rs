use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use ledger_api::{routes, server};
use ledger_protocol::Identity;
use ledger_runtime::{ConnectionConfig, MemoryGateway, SessionManager, SessionState};
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tower::ServiceExt;

const PROFILE: &str = r#"{"name":"test-network-org1","peers":{"peer0.org1.example.com":{"url":"grpc://localhost:7051"}}}"#;

struct TestApi {
	_dir: TempDir,
	sessions: SessionManager,
	app: Router,
}

async fn setup_with(enrolled: bool) -> TestApi {
	let dir = tempdir().unwrap();
	let profile_path = dir.path().join("connection-org1.json");
	std::fs::write(&profile_path, PROFILE).unwrap();

	let wallet_path = dir.path().join("wallet");
	if enrolled {
		std::fs::create_dir_all(&wallet_path).unwrap();
		let identity = serde_json::to_vec(&Identity::x509("Org1MSP", "CERT", "KEY")).unwrap();
		std::fs::write(wallet_path.join("appUser.id"), identity).unwrap();
	}

	let config = ConnectionConfig {
		profile_path,
		wallet_path,
		..ConnectionConfig::default()
	};
	let sessions = SessionManager::with_resolver(MemoryGateway::new(), config);
	let app = routes::router(sessions.clone());

	TestApi {
		_dir: dir,
		sessions,
		app,
	}
}

async fn setup() -> TestApi {
	setup_with(true).await
}

impl TestApi {
	async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
		let builder = Request::builder().method(method).uri(uri);
		let request = match body {
			Some(body) => builder
				.header("content-type", "application/json")
				.body(Body::from(body.to_string()))
				.unwrap(),
			None => builder.body(Body::empty()).unwrap(),
		};

		let response = self.app.clone().oneshot(request).await.unwrap();
		let status = response.status();
		let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
		let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
		(status, value)
	}

	async fn create(&self, id: &str) -> (StatusCode, Value) {
		self.call("POST", "/assets", Some(asset_body(id))).await
	}
}

fn asset_body(id: &str) -> Value {
	json!({
		"assetID": id,
		"dealerID": "D1",
		"msisdn": "254700000001",
		"mpin": "1234",
		"balance": 100,
		"status": "ACTIVE",
		"transAmount": 0,
		"transType": "OPEN",
		"remarks": "new account"
	})
}

#[tokio::test]
async fn create_asset_acknowledges_with_id() {
	let api = setup().await;

	let (status, body) = api.create("a1").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, json!({"message": "Asset created successfully", "assetID": "a1"}));
	assert_eq!(api.sessions.state(), SessionState::Ready);
}

#[tokio::test]
async fn create_with_missing_field_is_500() {
	let api = setup().await;
	let mut body = asset_body("a1");
	body.as_object_mut().unwrap().remove("balance");

	let (status, body) = api.call("POST", "/assets", Some(body)).await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert!(body["error"].as_str().unwrap().contains("balance"), "{body}");
}

#[tokio::test]
async fn create_duplicate_is_500() {
	let api = setup().await;
	api.create("a1").await;

	let (status, body) = api.create("a1").await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert!(body["error"].as_str().unwrap().contains("the asset a1 already exists"), "{body}");
}

#[tokio::test]
async fn numeric_strings_are_accepted_and_non_integers_rejected() {
	let api = setup().await;

	let mut body = asset_body("a1");
	body["balance"] = json!("250");
	let (status, _) = api.call("POST", "/assets", Some(body)).await;
	assert_eq!(status, StatusCode::OK);

	let mut body = asset_body("a2");
	body["balance"] = json!(12.5);
	let (status, body) = api.call("POST", "/assets", Some(body)).await;
	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert!(body["error"].as_str().unwrap().contains("12.5"), "{body}");
}

#[tokio::test]
async fn read_returns_ledger_record() {
	let api = setup().await;
	api.create("a1").await;

	let (status, body) = api.call("GET", "/assets/a1", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["DEALERID"], "D1");
	assert_eq!(body["BALANCE"], 100);
	assert_eq!(body["TRANSTYPE"], "OPEN");
}

#[tokio::test]
async fn read_unknown_asset_is_500() {
	let api = setup().await;

	let (status, body) = api.call("GET", "/assets/ghost", None).await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert!(body["error"].as_str().unwrap().contains("asset ghost does not exist"), "{body}");
}

#[tokio::test]
async fn update_then_history() {
	let api = setup().await;
	api.create("a1").await;

	let (status, body) = api
		.call(
			"PUT",
			"/assets/a1",
			Some(json!({
				"balance": "150",
				"status": "ACTIVE",
				"transType": "CREDIT",
				"remarks": "top up",
				"transAmount": 50
			})),
		)
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, json!({"message": "Asset updated successfully", "assetID": "a1"}));

	let (status, history) = api.call("GET", "/assets/a1/history", None).await;
	assert_eq!(status, StatusCode::OK);
	let versions = history.as_array().unwrap();
	assert_eq!(versions.len(), 2);
	assert_eq!(versions[0]["BALANCE"], 100);
	assert_eq!(versions[1]["BALANCE"], 150);
	assert_eq!(versions[1]["TRANSAMOUNT"], 50);
}

#[tokio::test]
async fn update_unknown_asset_is_500() {
	let api = setup().await;

	let (status, body) = api
		.call(
			"PUT",
			"/assets/ghost",
			Some(json!({"balance": 1, "status": "A", "transType": "T", "remarks": "R", "transAmount": 1})),
		)
		.await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert!(body["error"].as_str().unwrap().contains("does not exist"), "{body}");
}

#[tokio::test]
async fn list_is_empty_array_on_empty_ledger() {
	let api = setup().await;

	let (status, body) = api.call("GET", "/assets", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, json!([]));
}

#[tokio::test]
async fn list_returns_every_asset() {
	let api = setup().await;
	api.create("a1").await;
	api.create("a2").await;

	let (status, body) = api.call("GET", "/assets", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn history_of_unknown_asset_is_empty() {
	let api = setup().await;

	let (status, body) = api.call("GET", "/assets/ghost/history", None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, json!([]));
}

#[tokio::test]
async fn missing_identity_is_500() {
	let api = setup_with(false).await;

	let (status, body) = api.call("GET", "/assets", None).await;
	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert!(body["error"].as_str().unwrap().contains("\"appUser\" not found in wallet"), "{body}");
	assert_eq!(api.sessions.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn malformed_json_body_is_rejected_by_extractor() {
	let api = setup().await;
	let request = Request::builder()
		.method("POST")
		.uri("/assets")
		.header("content-type", "application/json")
		.body(Body::from("{\"assetID\": "))
		.unwrap();

	let response = api.app.clone().oneshot(request).await.unwrap();

	assert!(response.status().is_client_error());
	assert_eq!(api.sessions.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn shutdown_trigger_disconnects_and_stops_server() {
	let api = setup().await;
	api.sessions.handle().await.unwrap();
	assert_eq!(api.sessions.state(), SessionState::Ready);

	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let (tx, rx) = oneshot::channel::<()>();
	let trigger = async move {
		let _ = rx.await;
		"test"
	};
	let server = tokio::spawn(server::serve(listener, api.sessions.clone(), trigger));

	tx.send(()).unwrap();
	tokio::time::timeout(Duration::from_secs(5), server)
		.await
		.expect("server did not stop")
		.unwrap()
		.unwrap();

	assert_eq!(api.sessions.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn request_in_flight_at_shutdown_completes_before_disconnect() {
	let api = setup().await;
	api.sessions.handle().await.unwrap();

	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	let (tx, rx) = oneshot::channel::<()>();
	let trigger = async move {
		let _ = rx.await;
		"test"
	};
	let server = tokio::spawn(server::serve(listener, api.sessions.clone(), trigger));

	let body = asset_body("late").to_string();
	let mut stream = TcpStream::connect(addr).await.unwrap();
	let head = format!(
		"POST /assets HTTP/1.1\r\nhost: {addr}\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n",
		body.len()
	);
	stream.write_all(head.as_bytes()).await.unwrap();
	tokio::time::sleep(Duration::from_millis(100)).await;

	tx.send(()).unwrap();
	tokio::time::sleep(Duration::from_millis(50)).await;
	stream.write_all(body.as_bytes()).await.unwrap();

	let mut response = Vec::new();
	tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
		.await
		.expect("response did not arrive")
		.unwrap();
	let response = String::from_utf8_lossy(&response);
	assert!(response.starts_with("HTTP/1.1 200"), "{response}");

	tokio::time::timeout(Duration::from_secs(5), server)
		.await
		.expect("server did not stop")
		.unwrap()
		.unwrap();

	assert_eq!(api.sessions.state(), SessionState::Disconnected);
}
