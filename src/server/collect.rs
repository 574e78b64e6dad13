//! `/api/DataCollection` endpoints backing the site's analytics script.

// crates.io
use axum::{
	Json, Router,
	extract::State,
	http::{HeaderMap, StatusCode, header},
	response::{IntoResponse, Response},
	routing::{get, post},
};
// self
use super::{AppState, cookie};
use crate::{
	_prelude::*,
	analytics::{ClientContext, FeedbackSubmission, PageFeedback, UserVisit, VisitSubmission},
};

const UNKNOWN_IP: &str = "Unknown";
const ANONYMOUS_SESSION: &str = "anonymous";

#[derive(Serialize)]
struct Ack {
	success: bool,
	message: &'static str,
}

pub(crate) fn router() -> Router<AppState> {
	Router::new()
		.route("/visit", post(record_visit))
		.route("/feedback", post(record_feedback))
		.route("/stats", get(stats))
		.route("/raw-data", get(raw_data))
}

async fn record_visit(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(submission): Json<VisitSubmission>,
) -> Response {
	let visit = UserVisit::new(submission, client_context(&headers), OffsetDateTime::now_utc());
	let page_url = visit.page_url.clone();

	match state.analytics.record_visit(visit).await {
		Ok(()) => {
			tracing::info!(%page_url, "Visit recorded.");

			ack(StatusCode::OK, true, "Visit recorded successfully")
		},
		Err(e) => {
			tracing::error!(error = %e, "Failed to record visit.");

			ack(StatusCode::INTERNAL_SERVER_ERROR, false, "Failed to record visit")
		},
	}
}

async fn record_feedback(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(submission): Json<FeedbackSubmission>,
) -> Response {
	let feedback =
		PageFeedback::new(submission, client_context(&headers), OffsetDateTime::now_utc());
	let (page_url, was_helpful) = (feedback.page_url.clone(), feedback.was_helpful);

	match state.analytics.record_feedback(feedback).await {
		Ok(()) => {
			tracing::info!(%page_url, was_helpful, "Feedback recorded.");

			ack(StatusCode::OK, true, "Feedback recorded successfully")
		},
		Err(e) => {
			tracing::error!(error = %e, "Failed to record feedback.");

			ack(StatusCode::INTERNAL_SERVER_ERROR, false, "Failed to record feedback")
		},
	}
}

async fn stats(State(state): State<AppState>) -> Response {
	match state.analytics.stats().await {
		Ok(stats) => Json(stats).into_response(),
		Err(e) => {
			tracing::error!(error = %e, "Failed to compute analytics stats.");

			ack(StatusCode::INTERNAL_SERVER_ERROR, false, "Failed to retrieve stats")
		},
	}
}

async fn raw_data(State(state): State<AppState>) -> Response {
	match state.analytics.load().await {
		Ok(collection) => Json(collection).into_response(),
		Err(e) => {
			tracing::error!(error = %e, "Failed to load analytics document.");

			ack(StatusCode::INTERNAL_SERVER_ERROR, false, "Failed to retrieve raw data")
		},
	}
}

fn ack(status: StatusCode, success: bool, message: &'static str) -> Response {
	(status, Json(Ack { success, message })).into_response()
}

fn client_context(headers: &HeaderMap) -> ClientContext {
	ClientContext {
		ip_address: client_ip(headers),
		user_agent: header_str(headers, header::USER_AGENT.as_str()).unwrap_or_default().to_owned(),
		referrer: header_str(headers, header::REFERER.as_str())
			.filter(|referrer| !referrer.is_empty())
			.map(str::to_owned),
		session_id: cookie::read(headers, cookie::SESSION_COOKIE)
			.unwrap_or(ANONYMOUS_SESSION)
			.to_owned(),
	}
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`, then `Unknown`.
fn client_ip(headers: &HeaderMap) -> String {
	header_str(headers, "x-forwarded-for")
		.and_then(|forwarded| forwarded.split(',').next())
		.map(str::trim)
		.filter(|ip| !ip.is_empty())
		.or_else(|| header_str(headers, "x-real-ip").map(str::trim).filter(|ip| !ip.is_empty()))
		.unwrap_or(UNKNOWN_IP)
		.to_owned()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers.get(name).and_then(|value| value.to_str().ok())
}
