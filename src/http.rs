//! Shared outbound HTTP transport for the token endpoint and the directory.
//!
//! Every outbound call goes through [`ReqwestHttpClient::execute`], which reads the full body
//! so callers can classify failures without holding on to the live response.

// std
use std::ops::Deref;
// crates.io
use reqwest::{RequestBuilder, redirect::Policy};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
};

/// Timeout applied to every outbound call unless configured otherwise.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(10);

const BODY_PREVIEW_LIMIT: usize = 256;

/// Fully buffered response returned by [`ReqwestHttpClient::execute`].
#[derive(Clone, Debug)]
pub struct RawResponse {
	/// HTTP status code returned by the remote endpoint.
	pub status: u16,
	/// Complete response body.
	pub body: Vec<u8>,
}
impl RawResponse {
	/// HTTP status code.
	pub fn status(&self) -> u16 {
		self.status
	}

	/// Returns `true` for 2xx responses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn body_text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Body preview bounded for log lines and error messages.
	pub fn body_preview(&self) -> String {
		truncate_preview(self.body_text())
	}
}

/// Thin wrapper around [`ReqwestClient`] so timeout and redirect behavior live in one place.
///
/// Redirects are never followed: both the token endpoint and the directory answer directly,
/// and forwarding a bearer header to another host is not acceptable.
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Builds a client that bounds every request by `timeout`.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().timeout(timeout).redirect(Policy::none()).build()?;

		Ok(Self(client))
	}

	/// Sends `request`, buffers the whole body, and records the status.
	///
	/// `target` names the remote endpoint in transport errors.
	pub async fn execute(
		&self,
		target: &'static str,
		request: RequestBuilder,
	) -> Result<RawResponse, TransportError> {
		let response =
			request.send().await.map_err(|e| TransportError::from_reqwest(target, e))?;
		let status = response.status().as_u16();
		let body = response
			.bytes()
			.await
			.map_err(|e| TransportError::from_reqwest(target, e))?
			.to_vec();

		Ok(RawResponse { status, body })
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Decodes a JSON body, reporting the path of the first mismatch.
pub fn decode_json<T>(body: &[u8]) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
}

fn truncate_preview(mut body: String) -> String {
	if body.len() <= BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut cut = BODY_PREVIEW_LIMIT;

	while !body.is_char_boundary(cut) {
		cut -= 1;
	}

	body.truncate(cut);
	body.push('…');

	body
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn preview_truncates_on_char_boundaries() {
		let body = "é".repeat(BODY_PREVIEW_LIMIT);
		let preview = truncate_preview(body);

		assert!(preview.len() <= BODY_PREVIEW_LIMIT + '…'.len_utf8());
		assert!(preview.ends_with('…'));
		assert_eq!(truncate_preview("short".into()), "short");
	}

	#[test]
	fn decode_json_reports_the_failing_path() {
		#[derive(Debug, Deserialize)]
		struct Outer {
			#[allow(dead_code)]
			inner: Inner,
		}
		#[derive(Debug, Deserialize)]
		struct Inner {
			#[allow(dead_code)]
			count: u32,
		}

		let err = decode_json::<Outer>(br#"{"inner":{"count":"seven"}}"#)
			.expect_err("Mismatched field type must fail to decode.");

		assert_eq!(err.path().to_string(), "inner.count");
	}
}
