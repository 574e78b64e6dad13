//! JSON-file persistence for the analytics document.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
};
// self
use crate::{
	_prelude::*,
	analytics::{AnalyticsStats, DataCollection, PageFeedback, UserVisit},
	store::StoreError,
};

/// Appends analytics records to a single JSON document.
///
/// Writers are serialized through one async lock and replace the file atomically (temp file +
/// rename), so concurrent submissions never lose each other's records and readers never observe a
/// half-written document.
#[derive(Clone, Debug)]
pub struct FileAnalyticsStore {
	path: PathBuf,
	writer: Arc<AsyncMutex<()>>,
}
impl FileAnalyticsStore {
	/// Opens a store at `path`, creating its parent directory; the file itself appears on first write.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		ensure_parent_exists(&path)?;

		Ok(Self { path, writer: Arc::new(AsyncMutex::new(())) })
	}

	/// Location of the backing document.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Reads the whole document.
	///
	/// A missing or empty file yields an empty collection, as does unparsable content (with a
	/// warning). Only I/O failures are reported as errors.
	pub async fn load(&self) -> Result<DataCollection, StoreError> {
		let bytes = match fs::read(&self.path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(DataCollection::default()),
			Err(e) =>
				return Err(StoreError::Backend {
					message: format!("Failed to read {}: {e}", self.path.display()),
				}),
		};

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(DataCollection::default());
		}

		match serde_json::from_slice(&bytes) {
			Ok(collection) => Ok(collection),
			Err(e) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(
					path = %self.path.display(),
					error = %e,
					"Analytics document is not valid JSON; starting from an empty collection."
				);
				#[cfg(not(feature = "tracing"))]
				let _ = e;

				Ok(DataCollection::default())
			},
		}
	}

	/// Appends a visit.
	pub async fn record_visit(&self, visit: UserVisit) -> Result<(), StoreError> {
		self.update(|collection| collection.user_visits.push(visit)).await
	}

	/// Appends feedback.
	pub async fn record_feedback(&self, feedback: PageFeedback) -> Result<(), StoreError> {
		self.update(|collection| collection.page_feedback.push(feedback)).await
	}

	/// Aggregates counters over the current document.
	pub async fn stats(&self) -> Result<AnalyticsStats, StoreError> {
		Ok(self.load().await?.stats())
	}

	async fn update<F>(&self, mutate: F) -> Result<(), StoreError>
	where
		F: FnOnce(&mut DataCollection),
	{
		let _writer = self.writer.lock().await;
		let mut collection = self.load().await?;

		mutate(&mut collection);
		collection.last_updated = OffsetDateTime::now_utc();

		self.persist(&collection)
	}

	fn persist(&self, collection: &DataCollection) -> Result<(), StoreError> {
		ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(collection).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize analytics document: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}

fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
			message: format!("Failed to create analytics directory {}: {e}", parent.display()),
		})?;
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// std
	use std::env;
	// crates.io
	use uuid::Uuid;
	// self
	use super::*;
	use crate::analytics::{ClientContext, FeedbackSubmission, VisitSubmission};

	fn scratch_path() -> PathBuf {
		env::temp_dir().join(format!("uaepass-analytics-{}", Uuid::new_v4())).join("data.json")
	}

	fn context() -> ClientContext {
		ClientContext {
			ip_address: "198.51.100.4".into(),
			user_agent: "agent".into(),
			referrer: None,
			session_id: "s".into(),
		}
	}

	#[tokio::test]
	async fn missing_empty_and_corrupt_files_load_as_empty() {
		let path = scratch_path();
		let store = FileAnalyticsStore::open(&path).expect("Store should open.");

		assert!(store.load().await.expect("Missing file should load.").user_visits.is_empty());

		fs::write(&path, "  \n").expect("Blank file should be written.");

		assert!(store.load().await.expect("Blank file should load.").page_feedback.is_empty());

		fs::write(&path, "{not json").expect("Corrupt file should be written.");

		let stats = store.stats().await.expect("Corrupt file should still load.");

		assert_eq!(stats.total_visits, 0);
		assert_eq!(stats.total_feedback, 0);

		let _ = fs::remove_dir_all(path.parent().expect("Scratch path has a parent."));
	}

	#[tokio::test]
	async fn records_accumulate_and_bump_last_updated() {
		let path = scratch_path();
		let store = FileAnalyticsStore::open(&path).expect("Store should open.");
		let before = OffsetDateTime::now_utc() - Duration::seconds(1);

		store
			.record_visit(UserVisit::new(VisitSubmission::default(), context(), before))
			.await
			.expect("Visit should persist.");
		store
			.record_feedback(PageFeedback::new(
				FeedbackSubmission { was_helpful: true, ..Default::default() },
				context(),
				before,
			))
			.await
			.expect("Feedback should persist.");

		let reopened = FileAnalyticsStore::open(&path).expect("Store should reopen.");
		let collection = reopened.load().await.expect("Document should load.");

		assert_eq!(collection.user_visits.len(), 1);
		assert_eq!(collection.page_feedback.len(), 1);
		assert!(collection.last_updated > before);
		assert!(!path.with_extension("tmp").exists());

		let raw = fs::read_to_string(&path).expect("Document should be readable.");

		assert!(raw.contains("\"userVisits\""));
		assert!(raw.contains("\"lastUpdated\""));

		let _ = fs::remove_dir_all(path.parent().expect("Scratch path has a parent."));
	}

	#[tokio::test]
	async fn concurrent_writers_keep_every_record() {
		let path = scratch_path();
		let store = FileAnalyticsStore::open(&path).expect("Store should open.");
		let now = OffsetDateTime::now_utc();
		let writes = (0..16).map(|i| {
			let store = store.clone();

			tokio::spawn(async move {
				let submission =
					VisitSubmission { page_url: format!("/page/{i}"), ..Default::default() };

				store.record_visit(UserVisit::new(submission, context(), now)).await
			})
		});

		for handle in writes.collect::<Vec<_>>() {
			handle.await.expect("Writer task should join.").expect("Visit should persist.");
		}

		assert_eq!(store.stats().await.expect("Stats should load.").total_visits, 16);

		let _ = fs::remove_dir_all(path.parent().expect("Scratch path has a parent."));
	}
}
