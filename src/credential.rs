//! Credential holder: owns the current access credential and refreshes it lazily.
//!
//! The holder starts with [`Credential::sentinel`], which is stale at any instant after the
//! epoch, so the first request triggers an exchange. Readers receive an `Arc` snapshot and the
//! refresh swaps the pointer, so no reader ever observes a half-written credential. A single
//! async guard coalesces concurrent refreshes: callers that queued behind an exchange reuse its
//! result, whether it succeeded or failed, instead of stampeding the token endpoint. Each
//! exchange attempt bumps a counter; a caller that sees the counter move while it waited does
//! not fetch again.

mod exchange;

pub use exchange::*;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	error::CredentialFetchError,
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Result of [`CredentialHolder::ensure_fresh`].
#[derive(Debug)]
pub enum RefreshOutcome {
	/// The current credential was already valid; nothing was fetched.
	Fresh,
	/// A new credential was fetched and installed.
	Refreshed,
	/// The exchange failed; the stale credential stays in place and is used as-is.
	Degraded(Error),
}
impl RefreshOutcome {
	/// Returns `true` when a credential exchange succeeded during the call.
	pub fn is_refreshed(&self) -> bool {
		matches!(self, Self::Refreshed)
	}

	/// Returns `true` when the caller proceeds with a stale credential.
	pub fn is_degraded(&self) -> bool {
		matches!(self, Self::Degraded(_))
	}
}

/// Thread-safe owner of the process-wide access credential.
#[derive(Debug)]
pub struct CredentialHolder {
	exchange: TokenExchange,
	current: RwLock<Arc<Credential>>,
	/// Completed exchange attempts; only advanced while `refresh_guard` is held.
	attempts: AtomicU64,
	/// Rendered failure of the latest attempt, if it failed.
	refresh_guard: AsyncMutex<Option<String>>,
}
impl CredentialHolder {
	/// Creates a holder seeded with the stale sentinel.
	pub fn new(exchange: TokenExchange) -> Self {
		Self::with_credential(exchange, Credential::sentinel())
	}

	/// Creates a holder seeded with a specific credential.
	pub fn with_credential(exchange: TokenExchange, credential: Credential) -> Self {
		Self {
			exchange,
			current: RwLock::new(Arc::new(credential)),
			attempts: AtomicU64::new(0),
			refresh_guard: AsyncMutex::new(None),
		}
	}

	/// Returns a snapshot of the current credential.
	pub fn current(&self) -> Arc<Credential> {
		self.current.read().clone()
	}

	/// Ensures the current credential is valid now, fetching a replacement when it is stale.
	///
	/// Returns `Err` only for a broken invariant (unparseable stored expiry), which is fatal.
	/// Exchange failures are reported through [`RefreshOutcome::Degraded`].
	pub async fn ensure_fresh(&self) -> Result<RefreshOutcome> {
		self.ensure_fresh_at(OffsetDateTime::now_utc()).await
	}

	/// Same as [`CredentialHolder::ensure_fresh`], evaluated at `now`.
	pub async fn ensure_fresh_at(&self, now: OffsetDateTime) -> Result<RefreshOutcome> {
		if !self.current().is_stale_at(now)? {
			return Ok(RefreshOutcome::Fresh);
		}

		let seen = self.attempts.load(Ordering::Acquire);
		let mut last_failure = self.refresh_guard.lock().await;

		if !self.current().is_stale_at(now)? {
			return Ok(RefreshOutcome::Fresh);
		}
		if self.attempts.load(Ordering::Acquire) != seen {
			let message = last_failure.clone().unwrap_or_default();

			tracing::debug!(%message, "Reusing the failure of a concurrent credential refresh.");

			return Ok(RefreshOutcome::Degraded(
				CredentialFetchError::SharedAttemptFailed { message }.into(),
			));
		}

		let outcome = self.refresh().await;

		*last_failure = match &outcome {
			RefreshOutcome::Degraded(e) => Some(e.to_string()),
			_ => None,
		};
		self.attempts.fetch_add(1, Ordering::Release);

		Ok(outcome)
	}

	/// Fetches a credential and installs it, keeping the old one on failure.
	async fn refresh(&self) -> RefreshOutcome {
		const KIND: OpKind = OpKind::CredentialRefresh;

		let span = OpSpan::new(KIND, "refresh");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		span.instrument(async move {
			match self.exchange.fetch().await {
				Ok(credential) => {
					tracing::info!(
						expires_on = %credential.expires_on,
						lifetime = ?credential.lifetime(),
						extended_lifetime = ?credential.extended_lifetime(),
						"Installed a new access credential."
					);

					*self.current.write() = Arc::new(credential);

					obs::record_op_outcome(KIND, OpOutcome::Success);

					RefreshOutcome::Refreshed
				},
				Err(e) => {
					tracing::warn!(
						error = %e,
						token_endpoint = %self.exchange.token_endpoint(),
						"Credential refresh failed; continuing with the stale credential."
					);

					obs::record_op_outcome(KIND, OpOutcome::Failure);

					RefreshOutcome::Degraded(e.into())
				},
			}
		})
		.await
	}
}
