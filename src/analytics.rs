//! Page analytics for the demo site: visit and feedback records persisted as one JSON document.
//!
//! The document layout (camelCase keys, RFC 3339 timestamps) is shared with the site's
//! JavaScript collector, so field names are part of the contract.

pub mod file;

pub use file::FileAnalyticsStore;

// crates.io
use uuid::Uuid;
// self
use crate::_prelude::*;

/// Request-derived attributes stamped onto every record server-side.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientContext {
	/// Client IP (forwarded header first), or `Unknown`.
	pub ip_address: String,
	/// `User-Agent` header.
	pub user_agent: String,
	/// `Referer` header.
	pub referrer: Option<String>,
	/// Browser session identifier.
	pub session_id: String,
}

/// Visit payload accepted from the browser.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisitSubmission {
	/// Page URL.
	pub page_url: String,
	/// Page title.
	pub page_title: String,
	/// Seconds spent on the page.
	pub visit_duration: Option<u32>,
}

/// Feedback payload accepted from the browser.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedbackSubmission {
	/// Page URL.
	pub page_url: String,
	/// Page title.
	pub page_title: String,
	/// Whether the page answered the reader's question.
	pub was_helpful: bool,
	/// Optional free-text comment.
	pub comment: Option<String>,
}

/// Stored page visit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserVisit {
	/// Record identifier (UUID v4).
	pub id: String,
	/// Page URL.
	pub page_url: String,
	/// Page title.
	pub page_title: String,
	/// `User-Agent` header.
	pub user_agent: String,
	/// Client IP.
	pub ip_address: String,
	/// `Referer` header.
	#[serde(default)]
	pub referrer: Option<String>,
	/// When the visit was recorded.
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
	/// Browser session identifier.
	pub session_id: String,
	/// Seconds spent on the page.
	#[serde(default)]
	pub visit_duration: Option<u32>,
}
impl UserVisit {
	/// Builds a stored visit from a browser submission and its request context.
	pub fn new(submission: VisitSubmission, context: ClientContext, now: OffsetDateTime) -> Self {
		Self {
			id: Uuid::new_v4().to_string(),
			page_url: submission.page_url,
			page_title: submission.page_title,
			user_agent: context.user_agent,
			ip_address: context.ip_address,
			referrer: context.referrer,
			timestamp: now,
			session_id: context.session_id,
			visit_duration: submission.visit_duration,
		}
	}
}

/// Stored page feedback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFeedback {
	/// Record identifier (UUID v4).
	pub id: String,
	/// Page URL.
	pub page_url: String,
	/// Page title.
	pub page_title: String,
	/// Whether the page was helpful.
	pub was_helpful: bool,
	/// Optional free-text comment.
	#[serde(default)]
	pub comment: Option<String>,
	/// `User-Agent` header.
	pub user_agent: String,
	/// Client IP.
	pub ip_address: String,
	/// When the feedback was recorded.
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
	/// Browser session identifier.
	pub session_id: String,
}
impl PageFeedback {
	/// Builds stored feedback from a browser submission and its request context.
	pub fn new(submission: FeedbackSubmission, context: ClientContext, now: OffsetDateTime) -> Self {
		Self {
			id: Uuid::new_v4().to_string(),
			page_url: submission.page_url,
			page_title: submission.page_title,
			was_helpful: submission.was_helpful,
			comment: submission.comment,
			user_agent: context.user_agent,
			ip_address: context.ip_address,
			timestamp: now,
			session_id: context.session_id,
		}
	}
}

/// Whole analytics document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataCollection {
	/// Recorded visits, oldest first.
	#[serde(default)]
	pub user_visits: Vec<UserVisit>,
	/// Recorded feedback, oldest first.
	#[serde(default)]
	pub page_feedback: Vec<PageFeedback>,
	/// Time of the last write.
	#[serde(with = "time::serde::rfc3339", default = "OffsetDateTime::now_utc")]
	pub last_updated: OffsetDateTime,
}
impl DataCollection {
	/// Aggregates counters over the document.
	pub fn stats(&self) -> AnalyticsStats {
		let helpful = self.page_feedback.iter().filter(|feedback| feedback.was_helpful).count();

		AnalyticsStats {
			total_visits: self.user_visits.len(),
			total_feedback: self.page_feedback.len(),
			helpful_feedback: helpful,
			not_helpful_feedback: self.page_feedback.len() - helpful,
			last_updated: self.last_updated,
		}
	}
}
impl Default for DataCollection {
	fn default() -> Self {
		Self {
			user_visits: Vec::new(),
			page_feedback: Vec::new(),
			last_updated: OffsetDateTime::now_utc(),
		}
	}
}

/// Aggregate counters served by the stats endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsStats {
	/// Number of visits.
	pub total_visits: usize,
	/// Number of feedback entries.
	pub total_feedback: usize,
	/// Feedback marked helpful.
	pub helpful_feedback: usize,
	/// Feedback marked not helpful.
	pub not_helpful_feedback: usize,
	/// Time of the last write.
	#[serde(with = "time::serde::rfc3339")]
	pub last_updated: OffsetDateTime,
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	fn context() -> ClientContext {
		ClientContext {
			ip_address: "203.0.113.7".into(),
			user_agent: "test-agent".into(),
			referrer: Some("https://example.com/".into()),
			session_id: "session-1".into(),
		}
	}

	#[test]
	fn visit_serializes_with_camel_case_keys() {
		let visit = UserVisit::new(
			VisitSubmission { page_url: "/docs".into(), page_title: "Docs".into(), visit_duration: Some(12) },
			context(),
			datetime!(2025-03-01 10:00 UTC),
		);
		let json = serde_json::to_value(&visit).expect("Visit should serialize.");

		assert_eq!(json["pageUrl"], "/docs");
		assert_eq!(json["ipAddress"], "203.0.113.7");
		assert_eq!(json["sessionId"], "session-1");
		assert_eq!(json["visitDuration"], 12);
		assert_eq!(json["timestamp"], "2025-03-01T10:00:00Z");
		assert!(Uuid::parse_str(&visit.id).is_ok());
	}

	#[test]
	fn submissions_tolerate_missing_fields() {
		let feedback: FeedbackSubmission =
			serde_json::from_str(r#"{"pageUrl":"/","wasHelpful":true}"#)
				.expect("Partial feedback should deserialize.");

		assert!(feedback.was_helpful);
		assert_eq!(feedback.page_title, "");
		assert_eq!(feedback.comment, None);
	}

	#[test]
	fn stats_split_feedback_by_helpfulness() {
		let now = datetime!(2025-03-01 10:00 UTC);
		let feedback = |helpful| {
			PageFeedback::new(
				FeedbackSubmission { was_helpful: helpful, ..Default::default() },
				context(),
				now,
			)
		};
		let collection = DataCollection {
			user_visits: vec![UserVisit::new(VisitSubmission::default(), context(), now)],
			page_feedback: vec![feedback(true), feedback(false), feedback(true)],
			last_updated: now,
		};
		let stats = collection.stats();

		assert_eq!(stats.total_visits, 1);
		assert_eq!(stats.total_feedback, 3);
		assert_eq!(stats.helpful_feedback, 2);
		assert_eq!(stats.not_helpful_feedback, 1);
		assert_eq!(stats.last_updated, now);
	}
}
