//! Logout URL construction.
//!
//! Unlike the authorization query, the post-logout redirect is percent-encoded: every byte
//! outside the RFC 3986 unreserved set is escaped, so a space becomes `%20`.

// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
// self
use crate::{
	flows::Broker,
	http::ProviderHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowSpan},
	provider::Endpoint,
};

const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

impl<C, M> Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds `{base}/idshub/logout`, appending `?redirect_uri=` when a non-empty redirect is
	/// supplied.
	pub fn logout_url(&self, redirect_uri: Option<&str>) -> String {
		let _span = FlowSpan::new(FlowKind::Logout, "logout_url").entered();
		let logout = &self.endpoints().logout;
		let url = match redirect_uri.filter(|redirect| !redirect.is_empty()) {
			Some(redirect) =>
				format!("{logout}?redirect_uri={}", utf8_percent_encode(redirect, UNRESERVED)),
			None => logout.clone(),
		};

		obs::log_provider_url(self.config().enable_logging, Endpoint::Logout, &url);

		url
	}
}
