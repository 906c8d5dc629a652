//! Fixtures shared by the gateway integration tests.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use axum::{
	body::{self, Body},
	http::{Request, StatusCode, header::CONTENT_TYPE},
};
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;
// self
use entitlement_gateway::{
	auth::{Credential, Secret},
	config::Settings,
	credential::{CredentialHolder, TokenExchange},
	http::ReqwestHttpClient,
	lookup::LookupProxy,
	server::{self, AppState},
};

pub const TENANT: &str = "tenant-it";
pub const API_VERSION: &str = "1.6";
pub const TOKEN_PATH: &str = "/tenant-it/oauth2/token";
pub const CALLER_IP: &str = "198.51.100.4";

/// Settings whose token endpoint and directory both live on `server`.
pub fn settings_for(server: &MockServer) -> Settings {
	settings_with(server, serde_json::json!({}))
}

/// Same as [`settings_for`] with extra keys merged on top.
pub fn settings_with(server: &MockServer, overrides: serde_json::Value) -> Settings {
	let mut raw = serde_json::json!({
		"client_id": "client-it",
		"client_secret": "secret-it",
		"resource": server.url("/graph"),
		"tenant": TENANT,
		"api-version": API_VERSION,
		"authority": server.base_url(),
		"request_timeout_secs": 2,
	});

	if let (Some(raw), Some(overrides)) = (raw.as_object_mut(), overrides.as_object()) {
		raw.extend(overrides.clone());
	}

	let settings: Settings =
		serde_json::from_value(raw).expect("Integration settings should deserialize.");

	settings.validate().expect("Integration settings should validate.");

	settings
}

/// Gateway state starting from the stale sentinel credential.
pub fn state_for(settings: &Settings) -> AppState {
	AppState::from_settings(settings).expect("Gateway state should assemble.")
}

/// Gateway state seeded with `credential`.
pub fn state_with_credential(settings: &Settings, credential: Credential) -> AppState {
	let http_client = ReqwestHttpClient::with_timeout(settings.request_timeout())
		.expect("Integration HTTP client should build.");
	let exchange =
		TokenExchange::new(http_client.clone(), settings).expect("Token exchange should build.");
	let credentials = Arc::new(CredentialHolder::with_credential(exchange, credential));
	let proxy =
		LookupProxy::new(credentials, http_client, settings).expect("Lookup proxy should build.");

	AppState::new(Arc::new(proxy), settings).expect("Gateway state should assemble.")
}

/// Bearer credential expiring `offset` from now.
pub fn credential_expiring_in(token: &str, offset: Duration) -> Credential {
	Credential {
		access_token: Secret::new(token),
		expires_on: (OffsetDateTime::now_utc() + offset).unix_timestamp().to_string(),
		..Credential::sentinel()
	}
}

/// AAD v1 token response with string-encoded numbers, valid for one hour.
pub fn token_body(token: &str) -> String {
	let now = OffsetDateTime::now_utc().unix_timestamp();

	format!(
		r#"{{"token_type":"Bearer","expires_in":"3600","ext_expires_in":"3600","expires_on":"{}","not_before":"{now}","resource":"https://graph.example.com","access_token":"{token}"}}"#,
		now + 3600
	)
}

/// Directory path listing `uid`'s assigned plans.
pub fn plans_path(uid: &str) -> String {
	format!("/graph/{API_VERSION}/users/{uid}/assignedPlans")
}

/// Response captured from the router.
pub struct Captured {
	pub status: StatusCode,
	pub content_type: Option<String>,
	pub body: String,
}

/// Sends `GET uri` through the router as a proxied caller.
pub async fn get(state: &AppState, uri: &str) -> Captured {
	let request = Request::builder()
		.uri(uri)
		.header("x-real-ip", CALLER_IP)
		.body(Body::empty())
		.expect("Request should build.");
	let response =
		server::router(state.clone()).oneshot(request).await.expect("Router is infallible.");
	let status = response.status();
	let content_type = response
		.headers()
		.get(CONTENT_TYPE)
		.and_then(|v| v.to_str().ok())
		.map(ToOwned::to_owned);
	let bytes =
		body::to_bytes(response.into_body(), usize::MAX).await.expect("Body should be readable.");

	Captured { status, content_type, body: String::from_utf8_lossy(&bytes).into_owned() }
}
