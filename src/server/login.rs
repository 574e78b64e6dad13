//! Login, profile, and logout pages.

// crates.io
use axum::{
	Json,
	extract::{Query, State},
	http::{HeaderMap, StatusCode, header},
	response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use uuid::Uuid;
// self
use super::{
	AppState, SESSION_TTL,
	cookie::{self, ATTEMPT_COOKIE, SESSION_COOKIE},
};
use crate::{
	_prelude::*,
	auth::{AttemptId, SessionId},
	flows::{AuthenticatedUser, CallbackParams},
	store::DEFAULT_ATTEMPT_TTL,
};

const SIGNED_OUT_PAGE: &str = "<!doctype html>\n<html><head><title>UAE PASS demo</title></head>\
	<body><h1>UAE PASS demo</h1><p><a href=\"/login\">Sign in with UAE PASS</a></p></body></html>";
const SIGNED_IN_PAGE: &str = "<!doctype html>\n<html><head><title>UAE PASS demo</title></head>\
	<body><h1>UAE PASS demo</h1><p>You are signed in.</p>\
	<p><a href=\"/profile\">View profile</a> | <a href=\"/logout\">Sign out</a></p></body></html>";

pub(crate) async fn index(State(state): State<AppState>, headers: HeaderMap) -> Html<&'static str> {
	match current_user(&state, &headers) {
		Some(_) => Html(SIGNED_IN_PAGE),
		None => Html(SIGNED_OUT_PAGE),
	}
}

pub(crate) async fn login(State(state): State<AppState>) -> Response {
	match state.broker.begin_login(&state.attempts).await {
		Ok(redirect) => {
			let attempt_cookie = cookie::set(
				ATTEMPT_COOKIE,
				&redirect.attempt_id,
				DEFAULT_ATTEMPT_TTL,
				state.secure_cookies(),
			);

			(
				AppendHeaders([(header::SET_COOKIE, attempt_cookie)]),
				Redirect::to(&redirect.authorize_url),
			)
				.into_response()
		},
		Err(e) => failure_page(&e).into_response(),
	}
}

pub(crate) async fn callback(
	State(state): State<AppState>,
	headers: HeaderMap,
	Query(params): Query<CallbackParams>,
) -> Response {
	let secure = state.secure_cookies();
	let clear_attempt = (header::SET_COOKIE, cookie::clear(ATTEMPT_COOKIE, secure));
	let attempt_id =
		cookie::read(&headers, ATTEMPT_COOKIE).and_then(|value| AttemptId::new(value).ok());
	let outcome = match attempt_id {
		Some(attempt_id) => state.broker.complete_login(&state.attempts, &attempt_id, params).await,
		None => Err(Error::StateMismatch),
	};

	match outcome {
		Ok(user) => {
			let session_id = SessionId::generate();
			let session_cookie = cookie::set(SESSION_COOKIE, &session_id, SESSION_TTL, secure);

			state.sessions.write().insert(session_id, user);

			(
				AppendHeaders([clear_attempt, (header::SET_COOKIE, session_cookie)]),
				Redirect::to("/profile"),
			)
				.into_response()
		},
		Err(e) => {
			let (status, page) = failure_page(&e);

			(status, AppendHeaders([clear_attempt]), page).into_response()
		},
	}
}

pub(crate) async fn profile(State(state): State<AppState>, headers: HeaderMap) -> Response {
	match current_user(&state, &headers) {
		Some(user) => Json(user).into_response(),
		None => Redirect::to("/").into_response(),
	}
}

pub(crate) async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
	if let Some(session_id) = session_id(&headers) {
		state.sessions.write().remove(&session_id);
	}

	let target = state.broker.logout_url(state.logout_redirect_url.as_deref());

	(
		AppendHeaders([(header::SET_COOKIE, cookie::clear(SESSION_COOKIE, state.secure_cookies()))]),
		Redirect::to(&target),
	)
		.into_response()
}

fn session_id(headers: &HeaderMap) -> Option<SessionId> {
	cookie::read(headers, SESSION_COOKIE).and_then(|value| SessionId::new(value).ok())
}

fn current_user(state: &AppState, headers: &HeaderMap) -> Option<AuthenticatedUser> {
	state.session(&session_id(headers)?, OffsetDateTime::now_utc())
}

/// Logs `error` under a fresh correlation id and renders a page that exposes only that id.
fn failure_page(error: &Error) -> (StatusCode, Html<String>) {
	let correlation_id = Uuid::new_v4();
	let status = failure_status(error);

	tracing::error!(%correlation_id, status = status.as_u16(), error = ?error, "Login failed.");

	let page = format!(
		"<!doctype html>\n<html><head><title>Sign-in failed</title></head><body>\
		 <h1>Sign-in failed</h1><p>Please <a href=\"/login\">try again</a>.</p>\
		 <p>Reference: {correlation_id}</p></body></html>"
	);

	(status, Html(page))
}

fn failure_status(error: &Error) -> StatusCode {
	if error.is_client_fault() {
		StatusCode::BAD_REQUEST
	} else if matches!(error, Error::Storage(_) | Error::Config(_)) {
		StatusCode::INTERNAL_SERVER_ERROR
	} else {
		StatusCode::BAD_GATEWAY
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{error::TransportError, provider::Endpoint, store::StoreError};

	#[test]
	fn failures_map_to_status_by_fault() {
		assert_eq!(failure_status(&Error::StateMismatch), StatusCode::BAD_REQUEST);
		assert_eq!(failure_status(&Error::MissingEmiratesId), StatusCode::BAD_REQUEST);
		assert_eq!(
			failure_status(&TransportError::Timeout { endpoint: Endpoint::Token }.into()),
			StatusCode::BAD_GATEWAY
		);
		assert_eq!(
			failure_status(&StoreError::Backend { message: "down".into() }.into()),
			StatusCode::INTERNAL_SERVER_ERROR
		);
	}
}
