//! Gateway settings loaded once at startup from a JSON file plus environment overrides.
//!
//! File keys follow the historical `config.json` layout (`api-version`, `externalURL`).
//! Environment variables prefixed with [`Settings::ENV_PREFIX`] override file values, e.g.
//! `ENTITLEMENT_GATEWAY_CLIENT_SECRET`. `ENTITLEMENT_GATEWAY_API_VERSION` and
//! `ENTITLEMENT_GATEWAY_EXTERNAL_URL` (or `_EXTERNALURL`) map onto the two legacy keys.

// std
use std::path::Path;
// crates.io
use figment::{
	Figment,
	providers::{Env, Format, Json},
	value::{Uncased, UncasedStr},
};
// self
use crate::{_prelude::*, auth::Secret, error::ConfigError, http::DEFAULT_TIMEOUT};

/// Default identity-provider login host.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
/// Default OAuth grant type.
pub const DEFAULT_GRANT_TYPE: &str = "client_credentials";
/// Default status returned for identities that fail validation.
pub const DEFAULT_INVALID_IDENTITY_STATUS: u16 = 400;

/// Read-only process configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret; redacted in `Debug`.
	pub client_secret: Secret,
	/// Directory resource URL; also the base of lookup requests.
	pub resource: String,
	/// OAuth grant type sent to the token endpoint.
	#[serde(default = "default_grant_type")]
	pub grant_type: String,
	/// Directory tenant identifier.
	pub tenant: String,
	/// Directory API version path segment.
	#[serde(rename = "api-version")]
	pub api_version: String,
	/// Public base URL that browsers use to reach the gateway; empty means same origin.
	#[serde(rename = "externalURL", default)]
	pub external_url: String,
	/// Identity-provider login host.
	#[serde(default = "default_authority")]
	pub authority: String,
	/// Timeout in seconds for every outbound call.
	#[serde(default = "default_request_timeout_secs")]
	pub request_timeout_secs: u64,
	/// Status returned when the caller's identity fails validation.
	#[serde(default = "default_invalid_identity_status")]
	pub invalid_identity_status: u16,
}
impl Settings {
	/// Prefix for environment overrides.
	pub const ENV_PREFIX: &str = "ENTITLEMENT_GATEWAY_";

	/// Loads and validates settings from `path`, applying environment overrides.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		Self::from_figment(Self::figment(path))
	}

	/// JSON file at `path` overlaid with prefixed environment variables.
	pub fn figment(path: impl AsRef<Path>) -> Figment {
		Figment::new().merge(Json::file(path.as_ref())).merge(
			Env::prefixed(Self::ENV_PREFIX).map(settings_key).lowercase(false),
		)
	}

	/// Extracts and validates settings from an assembled figment.
	pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
		let settings: Self = figment.extract()?;

		settings.validate()?;

		Ok(settings)
	}

	/// Checks required fields, URL shapes, and numeric ranges.
	pub fn validate(&self) -> Result<(), ConfigError> {
		for (field, value) in [
			("client_id", self.client_id.as_str()),
			("client_secret", self.client_secret.expose()),
			("resource", self.resource.as_str()),
			("grant_type", self.grant_type.as_str()),
			("tenant", self.tenant.as_str()),
			("api-version", self.api_version.as_str()),
		] {
			if value.trim().is_empty() {
				return Err(ConfigError::MissingField { field });
			}
		}

		self.resource_url()?;
		self.token_endpoint()?;

		if !self.external_url.is_empty() {
			parse_base_url("externalURL", &self.external_url)?;
		}
		if self.request_timeout_secs == 0 {
			return Err(ConfigError::NonPositiveTimeout);
		}
		if !(400..600).contains(&self.invalid_identity_status) {
			return Err(ConfigError::InvalidStatus { status: self.invalid_identity_status });
		}

		Ok(())
	}

	/// Directory base URL.
	pub fn resource_url(&self) -> Result<Url, ConfigError> {
		parse_base_url("resource", &self.resource)
	}

	/// Token endpoint for the configured authority and tenant.
	pub fn token_endpoint(&self) -> Result<Url, ConfigError> {
		let mut url = parse_base_url("authority", &self.authority)?;

		url.path_segments_mut()
			.map_err(|_| ConfigError::NotHierarchical { field: "authority" })?
			.pop_if_empty()
			.extend([self.tenant.as_str(), "oauth2", "token"]);

		Ok(url)
	}

	/// Timeout applied to every outbound call.
	pub fn request_timeout(&self) -> StdDuration {
		if self.request_timeout_secs == 0 {
			DEFAULT_TIMEOUT
		} else {
			StdDuration::from_secs(self.request_timeout_secs)
		}
	}

	/// External base URL without a trailing slash, ready to prefix absolute paths.
	pub fn external_base(&self) -> &str {
		self.external_url.trim_end_matches('/')
	}
}

// `Env` lowercases keys after mapping unless told otherwise, which would break `externalURL`.
fn settings_key(env_key: &UncasedStr) -> Uncased<'_> {
	match env_key.as_str().to_ascii_lowercase().as_str() {
		"api_version" | "api-version" => "api-version".into(),
		"external_url" | "externalurl" => "externalURL".into(),
		other => other.to_owned().into(),
	}
}

fn parse_base_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
	let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { field, source })?;

	if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
		return Err(ConfigError::NotHierarchical { field });
	}

	Ok(url)
}

fn default_grant_type() -> String {
	DEFAULT_GRANT_TYPE.into()
}

fn default_authority() -> String {
	DEFAULT_AUTHORITY.into()
}

fn default_request_timeout_secs() -> u64 {
	DEFAULT_TIMEOUT.as_secs()
}

fn default_invalid_identity_status() -> u16 {
	DEFAULT_INVALID_IDENTITY_STATUS
}
