//! Thread-safe in-memory [`AttemptStore`] for single-process deployments and tests.

// self
use crate::{
	_prelude::*,
	auth::AttemptId,
	store::{AttemptStore, PendingAttempt, StoreError, StoreFuture},
};

type AttemptMap = Arc<RwLock<HashMap<AttemptId, PendingAttempt>>>;

/// Keeps pending attempts in-process; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryAttemptStore(AttemptMap);
impl MemoryAttemptStore {
	/// Number of attempts currently held.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// `true` when no attempt is pending.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn save_now(map: &AttemptMap, id: AttemptId, attempt: PendingAttempt) -> Result<(), StoreError> {
		map.write().insert(id, attempt);

		Ok(())
	}

	fn purge_now(map: &AttemptMap, now: OffsetDateTime) -> usize {
		let mut guard = map.write();
		let before = guard.len();

		guard.retain(|_, attempt| !attempt.is_expired_at(now));

		before - guard.len()
	}
}
impl AttemptStore for MemoryAttemptStore {
	fn save(&self, id: AttemptId, attempt: PendingAttempt) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::save_now(&map, id, attempt) })
	}

	fn take<'a>(&'a self, id: &'a AttemptId) -> StoreFuture<'a, Option<PendingAttempt>> {
		Box::pin(async move { Ok(self.0.write().remove(id)) })
	}

	fn purge_expired(&self, now: OffsetDateTime) -> StoreFuture<'_, usize> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::purge_now(&map, now)) })
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[tokio::test]
	async fn take_consumes_the_attempt_once() {
		let store = MemoryAttemptStore::default();
		let id = AttemptId::generate();
		let attempt = PendingAttempt::new("state", None, OffsetDateTime::now_utc());

		store.save(id.clone(), attempt.clone()).await.expect("Save should succeed.");

		assert_eq!(store.len(), 1);
		assert_eq!(store.take(&id).await.expect("Take should succeed."), Some(attempt));
		assert_eq!(store.take(&id).await.expect("Second take should succeed."), None);
		assert!(store.is_empty());
	}

	#[tokio::test]
	async fn purge_drops_only_expired_attempts() {
		let store = MemoryAttemptStore::default();
		let created = datetime!(2025-01-01 00:00 UTC);

		store
			.save(AttemptId::generate(), PendingAttempt::new("old", None, created))
			.await
			.expect("Save should succeed.");
		store
			.save(
				AttemptId::generate(),
				PendingAttempt::new("fresh", None, created + Duration::minutes(8)),
			)
			.await
			.expect("Save should succeed.");

		let removed = store
			.purge_expired(created + Duration::minutes(12))
			.await
			.expect("Purge should succeed.");

		assert_eq!(removed, 1);
		assert_eq!(store.len(), 1);
	}
}
