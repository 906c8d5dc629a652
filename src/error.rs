//! Gateway-level error types shared across the credential holder, lookup proxy, and server.

// self
use crate::{_prelude::*, auth::IdentityError, directory::RESOURCE_NOT_FOUND};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type JsonPathError = serde_path_to_error::Error<serde_json::Error>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Broken process invariant; the gateway must stop serving.
	#[error(transparent)]
	Internal(#[from] InternalError),
	/// Transport failure (DNS, TCP, TLS, timeout) while calling the directory.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The token endpoint could not issue a credential.
	#[error(transparent)]
	CredentialFetch(#[from] CredentialFetchError),
	/// Caller-supplied identity is not a syntactically valid email address.
	#[error(transparent)]
	InvalidIdentity(#[from] IdentityError),

	/// Directory returned a structured error envelope.
	#[error("Directory returned {code} (HTTP {status}): {message}")]
	Downstream {
		/// HTTP status code returned by the directory.
		status: u16,
		/// Machine-readable error code, e.g. `Request_ResourceNotFound`.
		code: String,
		/// Human-readable error message.
		message: String,
		/// Directory request identifier, when supplied.
		request_id: Option<String>,
		/// Directory timestamp of the failure, when supplied.
		date: Option<String>,
	},
	/// Directory returned a failure whose body is not an error envelope.
	#[error("request was not successful")]
	DownstreamDecode {
		/// HTTP status code returned by the directory.
		status: u16,
		/// Raw response body, kept for audit logs only.
		body: String,
	},
	/// Directory answered 200 with a body that is not a plan list.
	#[error("Directory returned a malformed plan list.")]
	DownstreamPayload {
		/// Structured parsing failure.
		#[source]
		source: JsonPathError,
	},
}
impl Error {
	/// Returns `true` when the error signals a broken invariant and the process must stop.
	pub fn is_fatal(&self) -> bool {
		matches!(self, Self::Internal(_))
	}

	/// Returns `true` when the directory reported that the requested user does not exist.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::Downstream { code, .. } if code == RESOURCE_NOT_FOUND)
	}

	/// Returns the raw diagnostic payload recorded in audit logs.
	pub fn diagnostic(&self) -> String {
		match self {
			Self::Downstream { message, .. } => message.clone(),
			Self::DownstreamDecode { body, .. } => body.clone(),
			other => other.to_string(),
		}
	}
}

/// Configuration and validation failures raised while assembling the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Settings could not be read or deserialized.
	#[error("Settings could not be loaded.")]
	Load {
		/// Underlying figment failure.
		#[source]
		source: Box<figment::Error>,
	},
	/// A required setting is empty.
	#[error("Setting `{field}` must not be empty.")]
	MissingField {
		/// Setting key.
		field: &'static str,
	},
	/// A URL-valued setting cannot be parsed.
	#[error("Setting `{field}` is not a valid URL.")]
	InvalidUrl {
		/// Setting key.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A URL-valued setting cannot carry path segments.
	#[error("Setting `{field}` must be a hierarchical http(s) URL.")]
	NotHierarchical {
		/// Setting key.
		field: &'static str,
	},
	/// The outbound request timeout is zero.
	#[error("Setting `request_timeout_secs` must be positive.")]
	NonPositiveTimeout,
	/// The configured invalid-identity status is not an error status.
	#[error("Setting `invalid_identity_status` must be a 4xx or 5xx code, got {status}.")]
	InvalidStatus {
		/// Rejected status value.
		status: u16,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
impl From<figment::Error> for ConfigError {
	fn from(e: figment::Error) -> Self {
		Self::Load { source: Box::new(e) }
	}
}

/// Broken invariants that cannot be recovered from within the running process.
#[derive(Debug, ThisError)]
pub enum InternalError {
	/// The stored credential expiry is not an integer timestamp.
	#[error("Stored credential expiry `{value}` is not an integer timestamp.")]
	InvalidExpiry {
		/// Raw stored value.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: std::num::ParseIntError,
	},
	/// The stored credential expiry is outside the representable range.
	#[error("Stored credential expiry `{value}` is out of range.")]
	ExpiryOutOfRange {
		/// Raw stored value.
		value: String,
		/// Underlying range failure.
		#[source]
		source: time::error::ComponentRange,
	},
}

/// Failures raised while exchanging client credentials for an access token.
#[derive(Debug, ThisError)]
pub enum CredentialFetchError {
	/// The token endpoint could not be reached or timed out.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The token endpoint answered with a non-success status.
	#[error("Token endpoint rejected the request (HTTP {status}): {message}.")]
	Rejected {
		/// HTTP status code returned by the token endpoint.
		status: u16,
		/// Provider error description or a preview of the body.
		message: String,
	},
	/// The token endpoint responded with malformed JSON.
	#[error("Token endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: JsonPathError,
		/// HTTP status code returned by the token endpoint.
		status: u16,
	},
	/// The issued token is not a bearer token.
	#[error("Token endpoint issued an unsupported token type `{token_type}`.")]
	UnsupportedTokenType {
		/// Token type reported by the provider.
		token_type: String,
	},
	/// The issued token carries an unusable expiry.
	#[error("Token endpoint returned an unusable expiry.")]
	Expiry {
		/// Underlying expiry validation failure.
		#[source]
		source: InternalError,
	},
	/// A concurrent refresh attempt that this caller waited on failed.
	#[error("Concurrent credential refresh failed: {message}")]
	SharedAttemptFailed {
		/// Rendered failure of the attempt that ran.
		message: String,
	},
}

/// Transport-level failures (network, timeout) for outbound calls.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The request did not complete within the configured timeout.
	#[error("Request to the {target} timed out.")]
	Timeout {
		/// Logical name of the remote endpoint.
		target: &'static str,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {target}.")]
	Network {
		/// Logical name of the remote endpoint.
		target: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Classifies a reqwest failure for the named endpoint.
	pub fn from_reqwest(target: &'static str, err: ReqwestError) -> Self {
		if err.is_timeout() {
			Self::Timeout { target }
		} else {
			Self::Network { target, source: Box::new(err) }
		}
	}
}
