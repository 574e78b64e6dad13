//! Correlation storage for in-flight logins.
//!
//! A login attempt is keyed by a server-generated [`AttemptId`] (carried by the browser as an
//! opaque cookie) and stores only a digest of the issued `state`. The callback consumes the
//! record exactly once, so a replayed or forged callback can never reach the token endpoint.

pub mod memory;

pub use memory::MemoryAttemptStore;

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::AttemptId};

/// Default lifetime of a pending login attempt.
pub const DEFAULT_ATTEMPT_TTL: Duration = Duration::minutes(10);

/// Boxed future returned by [`AttemptStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for pending login attempts.
pub trait AttemptStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the attempt stored under `id`.
	fn save(&self, id: AttemptId, attempt: PendingAttempt) -> StoreFuture<'_, ()>;

	/// Removes and returns the attempt stored under `id`, if any.
	fn take<'a>(&'a self, id: &'a AttemptId) -> StoreFuture<'a, Option<PendingAttempt>>;

	/// Drops every attempt that expired before `now`, returning how many were removed.
	fn purge_expired(&self, now: OffsetDateTime) -> StoreFuture<'_, usize>;
}

/// Server-side record of an authorization redirect awaiting its callback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAttempt {
	/// Base64url SHA-256 digest of the issued `state`.
	pub state_digest: String,
	/// Nonce sent with the authorization request, checked against the ID token.
	pub nonce: Option<String>,
	/// When the redirect was issued.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	/// When the attempt stops being accepted.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
}
impl PendingAttempt {
	/// Records a new attempt for `state` with the default time-to-live.
	pub fn new(state: &str, nonce: Option<String>, created_at: OffsetDateTime) -> Self {
		Self::with_ttl(state, nonce, created_at, DEFAULT_ATTEMPT_TTL)
	}

	/// Records a new attempt for `state` that expires after `ttl`.
	pub fn with_ttl(
		state: &str,
		nonce: Option<String>,
		created_at: OffsetDateTime,
		ttl: Duration,
	) -> Self {
		Self { state_digest: digest_state(state), nonce, created_at, expires_at: created_at + ttl }
	}

	/// `true` when `state` hashes to the stored digest.
	pub fn matches_state(&self, state: &str) -> bool {
		digest_state(state) == self.state_digest
	}

	/// `true` once `now` is past the expiry instant.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at
	}
}

/// Error type produced by [`AttemptStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

fn digest_state(state: &str) -> String {
	URL_SAFE_NO_PAD.encode(Sha256::digest(state.as_bytes()))
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn store_error_converts_into_broker_error_with_source() {
		let store_error = StoreError::Backend { message: "database unreachable".into() };
		let broker_error: Error = store_error.clone().into();

		assert!(matches!(broker_error, Error::Storage(_)));
		assert!(broker_error.to_string().contains("database unreachable"));

		let source = StdError::source(&broker_error)
			.expect("Broker error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn attempt_keeps_digest_not_raw_state() {
		let attempt = PendingAttempt::new("abc", None, datetime!(2025-01-01 00:00 UTC));

		assert_ne!(attempt.state_digest, "abc");
		assert!(attempt.matches_state("abc"));
		assert!(!attempt.matches_state("xyz"));
	}

	#[test]
	fn attempt_expires_after_ttl() {
		let created = datetime!(2025-01-01 00:00 UTC);
		let attempt = PendingAttempt::new("abc", Some("nonce".into()), created);

		assert!(!attempt.is_expired_at(created + Duration::minutes(9)));
		assert!(attempt.is_expired_at(created + Duration::minutes(10)));
	}
}
