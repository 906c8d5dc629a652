//! Immutable access credential issued by the identity provider, plus lifecycle helpers.

// crates.io
use serde::Deserializer;
// self
use crate::{_prelude::*, auth::Secret, error::InternalError};

/// Token kind accepted from the token endpoint.
pub const BEARER: &str = "Bearer";

/// Lifecycle status of a credential at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStatus {
	/// Expiry lies strictly after the instant.
	Fresh,
	/// Expiry is at or before the instant.
	Stale,
}

/// Immutable bearer credential as returned by the token endpoint.
///
/// Numeric fields are kept exactly as received. Azure AD encodes them as JSON strings while
/// other providers send numbers; both shapes decode into the same string representation, and
/// [`Credential::expires_at`] is the single place that interprets `expires_on`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credential {
	/// Token kind; always a case-insensitive match for [`BEARER`] once accepted.
	pub token_type: String,
	/// Total lifetime in seconds.
	#[serde(default, deserialize_with = "string_or_number")]
	pub expires_in: String,
	/// Extended lifetime in seconds (resilience window).
	#[serde(default, deserialize_with = "string_or_number")]
	pub ext_expires_in: String,
	/// Absolute expiry in seconds since the Unix epoch.
	#[serde(deserialize_with = "string_or_number")]
	pub expires_on: String,
	/// Issue instant in seconds since the Unix epoch.
	#[serde(default, deserialize_with = "string_or_number")]
	pub not_before: String,
	/// Resource the token was issued for.
	#[serde(default)]
	pub resource: String,
	/// Access token secret; callers must avoid logging it.
	pub access_token: Secret,
}
impl Credential {
	/// Returns the placeholder installed at startup; its epoch expiry forces a refresh on first
	/// use.
	pub fn sentinel() -> Self {
		Self {
			token_type: BEARER.into(),
			expires_in: "0".into(),
			ext_expires_in: "0".into(),
			expires_on: "0".into(),
			not_before: "0".into(),
			resource: String::new(),
			access_token: Secret::new(""),
		}
	}

	/// Parses the stored absolute expiry.
	pub fn expires_at(&self) -> Result<OffsetDateTime, InternalError> {
		let secs = self.expires_on.trim().parse::<i64>().map_err(|source| {
			InternalError::InvalidExpiry { value: self.expires_on.clone(), source }
		})?;

		OffsetDateTime::from_unix_timestamp(secs).map_err(|source| {
			InternalError::ExpiryOutOfRange { value: self.expires_on.clone(), source }
		})
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> Result<CredentialStatus, InternalError> {
		if self.expires_at()? > instant {
			Ok(CredentialStatus::Fresh)
		} else {
			Ok(CredentialStatus::Stale)
		}
	}

	/// Returns `true` if the credential must be replaced at the provided instant.
	pub fn is_stale_at(&self, instant: OffsetDateTime) -> Result<bool, InternalError> {
		Ok(matches!(self.status_at(instant)?, CredentialStatus::Stale))
	}

	/// Returns `true` if the token kind is bearer.
	pub fn is_bearer(&self) -> bool {
		self.token_type.eq_ignore_ascii_case(BEARER)
	}

	/// Total lifetime, when it parses.
	pub fn lifetime(&self) -> Option<Duration> {
		parse_seconds(&self.expires_in)
	}

	/// Extended lifetime, when it parses.
	pub fn extended_lifetime(&self) -> Option<Duration> {
		parse_seconds(&self.ext_expires_in)
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("token_type", &self.token_type)
			.field("expires_in", &self.expires_in)
			.field("ext_expires_in", &self.ext_expires_in)
			.field("expires_on", &self.expires_on)
			.field("not_before", &self.not_before)
			.field("resource", &self.resource)
			.field("access_token", &"<redacted>")
			.finish()
	}
}

fn parse_seconds(raw: &str) -> Option<Duration> {
	raw.trim().parse::<i64>().ok().map(Duration::seconds)
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw {
		Text(String),
		Integer(i64),
		Float(f64),
	}

	Ok(match Raw::deserialize(deserializer)? {
		Raw::Text(value) => value,
		Raw::Integer(value) => value.to_string(),
		Raw::Float(value) => value.to_string(),
	})
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn credential_expiring_on(expires_on: &str) -> Credential {
		Credential { expires_on: expires_on.into(), ..Credential::sentinel() }
	}

	#[test]
	fn sentinel_is_stale_after_the_epoch() {
		let sentinel = Credential::sentinel();

		assert_eq!(
			sentinel.expires_at().expect("Sentinel expiry must parse."),
			OffsetDateTime::UNIX_EPOCH
		);
		assert!(
			sentinel
				.is_stale_at(macros::datetime!(1970-01-01 00:00:01 UTC))
				.expect("Sentinel expiry must parse.")
		);
	}

	#[test]
	fn expiry_boundary_counts_as_stale() {
		let credential = credential_expiring_on("1735693200");
		let expiry = macros::datetime!(2025-01-01 01:00 UTC);

		assert_eq!(credential.status_at(expiry).ok(), Some(CredentialStatus::Stale));
		assert_eq!(
			credential.status_at(expiry - Duration::seconds(1)).ok(),
			Some(CredentialStatus::Fresh)
		);
	}

	#[test]
	fn malformed_expiry_is_an_internal_error() {
		let credential = credential_expiring_on("tomorrow");

		assert!(matches!(
			credential.is_stale_at(OffsetDateTime::now_utc()),
			Err(InternalError::InvalidExpiry { .. })
		));

		let credential = credential_expiring_on(&i64::MAX.to_string());

		assert!(matches!(credential.expires_at(), Err(InternalError::ExpiryOutOfRange { .. })));
	}

	#[test]
	fn decodes_string_and_numeric_fields() {
		let from_strings: Credential = serde_json::from_str(
			r#"{"token_type":"Bearer","expires_in":"3599","ext_expires_in":"10799","expires_on":"1735693200","not_before":"1735692900","resource":"https://graph.example.com","access_token":"abc"}"#,
		)
		.expect("String-encoded token response should decode.");
		let from_numbers: Credential = serde_json::from_str(
			r#"{"token_type":"bearer","expires_in":3599,"expires_on":1735693200,"access_token":"abc"}"#,
		)
		.expect("Number-encoded token response should decode.");

		assert_eq!(from_strings.expires_on, from_numbers.expires_on);
		assert_eq!(from_strings.lifetime(), Some(Duration::seconds(3599)));
		assert_eq!(from_strings.extended_lifetime(), Some(Duration::seconds(10799)));
		assert_eq!(from_strings.not_before, "1735692900");
		assert_eq!(from_numbers.extended_lifetime(), None);
		assert!(from_strings.is_bearer());
		assert!(from_numbers.is_bearer());
	}

	#[test]
	fn debug_redacts_access_token() {
		let credential =
			Credential { access_token: Secret::new("very-secret"), ..Credential::sentinel() };
		let rendered = format!("{credential:?}");

		assert!(rendered.contains("<redacted>"));
		assert!(!rendered.contains("very-secret"));
	}
}
