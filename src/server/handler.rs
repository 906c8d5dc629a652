//! Request handlers and the error-to-status mapping.

// std
use std::{convert::Infallible, net::SocketAddr};
// crates.io
use axum::{
	Json,
	extract::{ConnectInfo, FromRequestParts, Query, State},
	http::{StatusCode, request::Parts},
	response::{Html, IntoResponse, Response},
};
// self
use super::{API_VERSION, AppState, GENERIC_FAILURE_MESSAGE, INVALID_VERSION_MESSAGE};
use crate::{_prelude::*, directory::RESOURCE_NOT_FOUND};

const X_REAL_IP: &str = "x-real-ip";

/// Query string of `GET /ece/getPlans`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PlansQuery {
	/// API version requested by the caller; only `0.2` is served.
	#[serde(default)]
	pub version: Option<String>,
	/// Directory user principal name (an email address).
	#[serde(default)]
	pub uid: Option<String>,
}

/// Caller origin for audit logs: `X-Real-IP` when a proxy set it, else the socket peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteOrigin(pub String);
impl<S> FromRequestParts<S> for RemoteOrigin
where
	S: Send + Sync,
{
	type Rejection = Infallible;

	async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
		let origin = parts
			.headers
			.get(X_REAL_IP)
			.and_then(|v| v.to_str().ok())
			.map(str::trim)
			.filter(|v| !v.is_empty())
			.map(ToOwned::to_owned)
			.or_else(|| {
				parts
					.extensions
					.get::<ConnectInfo<SocketAddr>>()
					.map(|ConnectInfo(addr)| addr.to_string())
			})
			.unwrap_or_else(|| "unknown".into());

		Ok(Self(origin))
	}
}

/// `GET /`: the lookup form.
pub async fn index(State(state): State<AppState>) -> Html<String> {
	Html(state.index_page.to_string())
}

/// `GET /healthz`: liveness probe.
pub async fn healthz() -> &'static str {
	"ok"
}

/// `GET /ece/getPlans?version=0.2&uid=<email>`: enabled plans of one user.
pub async fn get_plans(
	State(state): State<AppState>,
	RemoteOrigin(remote_addr): RemoteOrigin,
	Query(query): Query<PlansQuery>,
) -> Response {
	let uid = query.uid.unwrap_or_default();

	if query.version.as_deref() != Some(API_VERSION) {
		tracing::warn!(
			uid = %uid,
			remote_addr = %remote_addr,
			version = ?query.version,
			"Rejected request without a supported version."
		);

		return (StatusCode::BAD_REQUEST, INVALID_VERSION_MESSAGE).into_response();
	}

	match state.proxy.lookup(&uid).await {
		Ok(plans) => {
			tracing::info!(
				uid = %uid,
				remote_addr = %remote_addr,
				plans = plans.assigned_plans.len(),
				"Response delivered."
			);

			Json(plans).into_response()
		},
		Err(e) => failure_response(&state, &uid, &remote_addr, e),
	}
}

fn failure_response(state: &AppState, uid: &str, remote_addr: &str, e: Error) -> Response {
	let message = e.diagnostic();

	if let Error::InvalidIdentity(_) = &e {
		tracing::warn!(
			uid = %uid,
			remote_addr = %remote_addr,
			message = %message,
			"Rejected malformed identity."
		);

		return (state.invalid_identity_status, e.to_string()).into_response();
	}
	if e.is_fatal() {
		tracing::error!(
			uid = %uid,
			remote_addr = %remote_addr,
			message = %message,
			"Broken invariant while serving a lookup."
		);
		state.shutdown.trigger_fatal();

		return (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE_MESSAGE).into_response();
	}
	if e.is_not_found() {
		tracing::warn!(
			uid = %uid,
			remote_addr = %remote_addr,
			message = %message,
			"Directory does not know the user."
		);

		return (StatusCode::NOT_FOUND, RESOURCE_NOT_FOUND).into_response();
	}

	tracing::error!(
		uid = %uid,
		remote_addr = %remote_addr,
		message = %message,
		error = %e,
		"Lookup failed."
	);

	(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE_MESSAGE).into_response()
}
