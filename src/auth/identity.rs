//! Caller-supplied directory identities, validated before any network call.

// std
use std::{ops::Deref, sync::LazyLock};
// crates.io
use regex::Regex;
// self
use crate::_prelude::*;

const IDENTITY_MAX_LEN: usize = 254;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(concat!(
		r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*",
		r"@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+",
		r"[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$",
	))
	.expect("Email pattern must compile.")
});

/// Error returned when identity validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentityError {
	/// The identity was empty.
	#[error("Identity cannot be empty.")]
	Empty,
	/// The identity contains whitespace characters.
	#[error("Identity contains whitespace.")]
	ContainsWhitespace,
	/// The identity exceeded the allowed character count.
	#[error("Identity exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
	/// The identity is not shaped like an email address.
	#[error("Identity `{value}` is not a valid email address.")]
	Malformed {
		/// Rejected value.
		value: String,
	},
}

/// Directory user principal name, guaranteed to be a syntactically valid email address.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserPrincipal(String);
impl UserPrincipal {
	/// Creates a new principal after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentityError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for UserPrincipal {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for UserPrincipal {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<UserPrincipal> for String {
	fn from(value: UserPrincipal) -> Self {
		value.0
	}
}
impl TryFrom<String> for UserPrincipal {
	type Error = IdentityError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Debug for UserPrincipal {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "UserPrincipal({})", self.0)
	}
}
impl Display for UserPrincipal {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for UserPrincipal {
	type Err = IdentityError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(view: &str) -> Result<(), IdentityError> {
	if view.is_empty() {
		return Err(IdentityError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentityError::ContainsWhitespace);
	}
	if view.chars().count() > IDENTITY_MAX_LEN {
		return Err(IdentityError::TooLong { max: IDENTITY_MAX_LEN });
	}
	if !EMAIL_RE.is_match(view) {
		return Err(IdentityError::Malformed { value: view.to_owned() });
	}

	Ok(())
}
