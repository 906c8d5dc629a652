//! Client-credentials exchange against the identity provider's token endpoint.

// crates.io
use reqwest::header::ACCEPT;
// self
use crate::{
	_prelude::*,
	auth::{Credential, Secret},
	config::Settings,
	error::{ConfigError, CredentialFetchError},
	http::{self, RawResponse, ReqwestHttpClient},
};

const TARGET: &str = "token endpoint";

/// Static inputs of the client-credentials grant plus the transport that sends it.
#[derive(Clone)]
pub struct TokenExchange {
	http_client: ReqwestHttpClient,
	token_endpoint: Url,
	client_id: String,
	client_secret: Secret,
	grant_type: String,
	resource: String,
}
impl TokenExchange {
	/// Builds the exchange from validated settings.
	pub fn new(http_client: ReqwestHttpClient, settings: &Settings) -> Result<Self, ConfigError> {
		Ok(Self {
			http_client,
			token_endpoint: settings.token_endpoint()?,
			client_id: settings.client_id.clone(),
			client_secret: settings.client_secret.clone(),
			grant_type: settings.grant_type.clone(),
			resource: settings.resource.clone(),
		})
	}

	/// Token endpoint the exchange posts to.
	pub fn token_endpoint(&self) -> &Url {
		&self.token_endpoint
	}

	/// Requests a new credential. Performs exactly one HTTP call and never retries.
	pub async fn fetch(&self) -> Result<Credential, CredentialFetchError> {
		let form = [
			("resource", self.resource.as_str()),
			("client_id", self.client_id.as_str()),
			("client_secret", self.client_secret.expose()),
			("grant_type", self.grant_type.as_str()),
		];
		let request = self
			.http_client
			.post(self.token_endpoint.clone())
			.header(ACCEPT, "application/json")
			.form(&form);
		let response = self.http_client.execute(TARGET, request).await?;

		if !response.is_success() {
			return Err(CredentialFetchError::Rejected {
				status: response.status(),
				message: rejection_message(&response),
			});
		}

		let credential: Credential = http::decode_json(&response.body)
			.map_err(|source| CredentialFetchError::Parse { source, status: response.status() })?;

		if !credential.is_bearer() {
			return Err(CredentialFetchError::UnsupportedTokenType {
				token_type: credential.token_type,
			});
		}

		credential.expires_at().map_err(|source| CredentialFetchError::Expiry { source })?;

		Ok(credential)
	}
}
impl Debug for TokenExchange {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenExchange")
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("client_id", &self.client_id)
			.field("grant_type", &self.grant_type)
			.field("resource", &self.resource)
			.finish()
	}
}

#[derive(Deserialize)]
struct OAuthErrorBody {
	error: String,
	#[serde(default)]
	error_description: Option<String>,
}

fn rejection_message(response: &RawResponse) -> String {
	match http::decode_json::<OAuthErrorBody>(&response.body) {
		Ok(OAuthErrorBody { error, error_description: Some(description) }) =>
			format!("{error}: {}", description.lines().next().unwrap_or_default()),
		Ok(OAuthErrorBody { error, error_description: None }) => error,
		Err(_) => response.body_preview(),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use httpmock::prelude::*;
	// self
	use super::*;
	use crate::error::TransportError;

	fn exchange_for(server: &MockServer) -> TokenExchange {
		let settings: Settings = serde_json::from_value(serde_json::json!({
			"client_id": "client",
			"client_secret": "secret",
			"resource": server.url("/graph"),
			"tenant": "tenant-1",
			"api-version": "v1.0",
			"authority": server.base_url(),
			"request_timeout_secs": 1,
		}))
		.expect("Test settings should deserialize.");
		let http_client = ReqwestHttpClient::with_timeout(settings.request_timeout())
			.expect("Test HTTP client should build.");

		TokenExchange::new(http_client, &settings).expect("Test exchange should build.")
	}

	#[tokio::test]
	async fn fetch_decodes_string_encoded_response() {
		let server = MockServer::start_async().await;
		let mock = server
			.mock_async(|when, then| {
				when.method(POST)
					.path("/tenant-1/oauth2/token")
					.header("content-type", "application/x-www-form-urlencoded");
				then.status(200).header("content-type", "application/json").body(
					r#"{"token_type":"Bearer","expires_in":"3599","ext_expires_in":"10799","expires_on":"4102444800","not_before":"4102441200","resource":"https://graph.example.com","access_token":"issued"}"#,
				);
			})
			.await;
		let credential = exchange_for(&server).fetch().await.expect("Fetch should succeed.");

		assert_eq!(credential.access_token.expose(), "issued");
		assert_eq!(credential.expires_on, "4102444800");

		mock.assert_async().await;
	}

	#[tokio::test]
	async fn fetch_surfaces_provider_error_description() {
		let server = MockServer::start_async().await;
		let _mock = server
			.mock_async(|when, then| {
				when.method(POST).path("/tenant-1/oauth2/token");
				then.status(401).header("content-type", "application/json").body(
					r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret.\r\nTrace ID: 1"}"#,
				);
			})
			.await;
		let err = exchange_for(&server).fetch().await.expect_err("Rejected fetch must fail.");

		match err {
			CredentialFetchError::Rejected { status, message } => {
				assert_eq!(status, 401);
				assert_eq!(message, "invalid_client: AADSTS7000215: Invalid client secret.");
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[tokio::test]
	async fn fetch_rejects_malformed_and_non_bearer_bodies() {
		let server = MockServer::start_async().await;
		let mut malformed = server
			.mock_async(|when, then| {
				when.method(POST).path("/tenant-1/oauth2/token");
				then.status(200).body(r#"{"token_type":"Bearer","access_token":"x"}"#);
			})
			.await;
		let exchange = exchange_for(&server);
		let err = exchange.fetch().await.expect_err("Missing expiry must fail to decode.");

		assert!(matches!(err, CredentialFetchError::Parse { status: 200, .. }));

		malformed.delete_async().await;

		let _mac = server
			.mock_async(|when, then| {
				when.method(POST).path("/tenant-1/oauth2/token");
				then.status(200).body(
					r#"{"token_type":"mac","expires_on":"4102444800","access_token":"x"}"#,
				);
			})
			.await;
		let err = exchange.fetch().await.expect_err("Non-bearer tokens must be rejected.");

		assert!(matches!(
			err,
			CredentialFetchError::UnsupportedTokenType { ref token_type } if token_type == "mac"
		));
	}

	#[tokio::test]
	async fn fetch_times_out_without_retrying() {
		let server = MockServer::start_async().await;
		let mock = server
			.mock_async(|when, then| {
				when.method(POST).path("/tenant-1/oauth2/token");
				then.status(200).delay(StdDuration::from_secs(3)).body("{}");
			})
			.await;
		let err = exchange_for(&server).fetch().await.expect_err("Slow endpoint must time out.");

		assert!(matches!(
			err,
			CredentialFetchError::Transport(TransportError::Timeout { target: TARGET })
		));

		mock.assert_calls_async(1).await;
	}
}
