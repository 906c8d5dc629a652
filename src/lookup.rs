//! Lookup proxy: validates the caller's identity, queries the directory with the current
//! credential, and reshapes the answer.

// crates.io
use reqwest::header::ACCEPT;
// self
use crate::{
	_prelude::*,
	auth::UserPrincipal,
	config::Settings,
	credential::{CredentialHolder, RefreshOutcome},
	directory::{AssignedPlans, ErrorEnvelope, PlanList},
	error::ConfigError,
	http::{self, RawResponse, ReqwestHttpClient},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

const TARGET: &str = "directory";

/// Stateless proxy for the directory's assigned-plans endpoint.
#[derive(Debug)]
pub struct LookupProxy {
	credentials: Arc<CredentialHolder>,
	http_client: ReqwestHttpClient,
	resource: Url,
	api_version: String,
}
impl LookupProxy {
	/// Builds a proxy sharing `credentials` and `http_client`.
	pub fn new(
		credentials: Arc<CredentialHolder>,
		http_client: ReqwestHttpClient,
		settings: &Settings,
	) -> Result<Self, ConfigError> {
		Ok(Self {
			credentials,
			http_client,
			resource: settings.resource_url()?,
			api_version: settings.api_version.clone(),
		})
	}

	/// Credential holder consulted before every lookup.
	pub fn credentials(&self) -> &Arc<CredentialHolder> {
		&self.credentials
	}

	/// Directory URL listing `principal`'s assigned plans.
	pub fn plans_url(&self, principal: &UserPrincipal) -> Url {
		let mut url = self.resource.clone();

		// `resource` is validated as a base URL when settings load.
		if let Ok(mut segments) = url.path_segments_mut() {
			segments.pop_if_empty().extend([
				self.api_version.as_str(),
				"users",
				principal.as_ref(),
				"assignedPlans",
			]);
		}

		url
	}

	/// Returns the enabled plans assigned to `identity`.
	///
	/// The identity is validated before any network call. A failed credential refresh does not
	/// abort the lookup; the directory call goes out with the stale token and its rejection is
	/// reported instead.
	pub async fn lookup(&self, identity: &str) -> Result<AssignedPlans> {
		const KIND: OpKind = OpKind::Lookup;

		let principal = UserPrincipal::new(identity)?;
		let span = OpSpan::new(KIND, "assigned_plans");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				if let RefreshOutcome::Degraded(e) = self.credentials.ensure_fresh().await? {
					tracing::debug!(uid = %principal, error = %e, "Looking up with a stale credential.");
				}

				let credential = self.credentials.current();
				let request = self
					.http_client
					.get(self.plans_url(&principal))
					.header(ACCEPT, "application/json")
					.bearer_auth(credential.access_token.expose());
				let response = self.http_client.execute(TARGET, request).await?;

				interpret(response)
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}
}

fn interpret(response: RawResponse) -> Result<AssignedPlans> {
	let status = response.status();

	if status == 200 {
		let list: PlanList = http::decode_json(&response.body)
			.map_err(|source| Error::DownstreamPayload { source })?;

		return Ok(list.into());
	}

	match http::decode_json::<ErrorEnvelope>(&response.body) {
		Ok(ErrorEnvelope { error }) => {
			let (request_id, date) = error
				.inner_error
				.map(|inner| (inner.request_id, inner.date))
				.unwrap_or_default();

			Err(Error::Downstream {
				status,
				code: error.code,
				message: error.message,
				request_id,
				date,
			})
		},
		Err(_) => Err(Error::DownstreamDecode { status, body: response.body_text() }),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::directory::RESOURCE_NOT_FOUND;

	fn response(status: u16, body: &str) -> RawResponse {
		RawResponse { status, body: body.as_bytes().to_vec() }
	}

	#[test]
	fn success_body_is_filtered() {
		let plans = interpret(response(
			200,
			r#"{"value":[{"capabilityStatus":"Enabled","service":"EXCHANGE"},{"capabilityStatus":"Disabled","service":"TEAMS"}]}"#,
		))
		.expect("Well-formed plan list should succeed.");

		assert_eq!(plans.assigned_plans.len(), 1);
		assert_eq!(plans.assigned_plans[0].service, "EXCHANGE");
	}

	#[test]
	fn malformed_success_body_is_a_payload_error() {
		let err = interpret(response(200, r#"{"value":{"not":"a list"}}"#))
			.expect_err("Malformed plan list must fail.");

		assert!(matches!(err, Error::DownstreamPayload { .. }));
		assert!(!err.is_fatal());
	}

	#[test]
	fn error_envelope_becomes_downstream_error() {
		let err = interpret(response(
			404,
			r#"{"error":{"code":"Request_ResourceNotFound","message":"no such user","innerError":{"requestId":"r-9","date":"2024-03-01T00:00:00"}}}"#,
		))
		.expect_err("Error envelope must fail.");

		match err {
			Error::Downstream { status, code, message, request_id, date } => {
				assert_eq!(status, 404);
				assert_eq!(code, RESOURCE_NOT_FOUND);
				assert_eq!(message, "no such user");
				assert_eq!(request_id.as_deref(), Some("r-9"));
				assert_eq!(date.as_deref(), Some("2024-03-01T00:00:00"));
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn unparseable_error_body_keeps_raw_payload() {
		let err = interpret(response(502, "<html>Bad Gateway</html>"))
			.expect_err("Non-JSON failure must fail.");

		assert!(matches!(
			&err,
			Error::DownstreamDecode { status: 502, body } if body == "<html>Bad Gateway</html>"
		));
		assert_eq!(err.to_string(), "request was not successful");
	}

	#[test]
	fn non_200_success_codes_are_not_treated_as_plan_lists() {
		let err = interpret(response(204, "")).expect_err("Only 200 carries a plan list.");

		assert!(matches!(err, Error::DownstreamDecode { status: 204, .. }));
	}
}
