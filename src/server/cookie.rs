//! Minimal `Cookie` / `Set-Cookie` handling for the two demo cookies.

// crates.io
use axum::http::{HeaderMap, header};
// self
use crate::_prelude::*;

pub(crate) const ATTEMPT_COOKIE: &str = "uaepass_attempt";
pub(crate) const SESSION_COOKIE: &str = "uaepass_session";

/// First value of cookie `name` across every `Cookie` header.
pub(crate) fn read<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers
		.get_all(header::COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(';'))
		.filter_map(|pair| pair.trim().split_once('='))
		.find(|(key, _)| *key == name)
		.map(|(_, value)| value.trim())
}

/// `HttpOnly`, `SameSite=Lax` cookie scoped to `/`.
pub(crate) fn set(name: &str, value: &str, max_age: Duration, secure: bool) -> String {
	format!("{name}={value}; {}; Max-Age={}", attributes(secure), max_age.whole_seconds())
}

/// Expires cookie `name` immediately.
pub(crate) fn clear(name: &str, secure: bool) -> String {
	format!("{name}=; {}; Max-Age=0", attributes(secure))
}

fn attributes(secure: bool) -> &'static str {
	if secure { "Path=/; HttpOnly; SameSite=Lax; Secure" } else { "Path=/; HttpOnly; SameSite=Lax" }
}
