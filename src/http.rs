//! Transport primitives for provider calls.
//!
//! [`ProviderHttpClient`] is the broker's only dependency on an HTTP stack. Every provider call
//! (token, userinfo, JWKS) is expressed as an [`HttpRequest`] and dispatched through the
//! [`AsyncHttpClient`] handle the implementation returns, so downstream crates can plug in custom
//! clients without touching flow code.

// std
use std::{ops::Deref, time::Duration as StdDuration};
// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{HeaderMap, header::RETRY_AFTER},
};
#[cfg(feature = "reqwest")] use reqwest::{ClientBuilder, Proxy, redirect::Policy};
use time::format_description::well_known::Rfc2822;
// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::{config::ClientConfig, error::ConfigError};

/// Abstraction over HTTP transports capable of executing provider calls.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared across broker clones,
/// and the handles they return must own whatever state is required so their request futures
/// remain `Send` for the lifetime of the in-flight operation.
pub trait ProviderHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle used for a single provider call.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Returns a handle ready to dispatch one request.
	fn handle(&self) -> Self::Handle;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Provider calls never follow redirects: the token and userinfo endpoints answer directly, and a
/// redirect there indicates a misconfigured base URL. Configure any custom [`ReqwestClient`] the
/// same way.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the configured timeout and optional proxy.
	pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
		Ok(Self(Self::client_builder(config)?.build()?))
	}

	/// Returns a [`ClientBuilder`] preloaded with the configured timeout, proxy, and redirect
	/// policy, for callers that need to adjust TLS or pooling before building.
	pub fn client_builder(config: &ClientConfig) -> Result<ClientBuilder, ConfigError> {
		let mut builder = ReqwestClient::builder()
			.timeout(config.timeout())
			.connect_timeout(config.timeout().min(StdDuration::from_secs(10)))
			.redirect(Policy::none());

		if let Some(proxy) = &config.proxy {
			let mut upstream = Proxy::all(&proxy.url)?;

			if let Some(username) = &proxy.username {
				upstream = upstream.basic_auth(username, proxy.password.as_deref().unwrap_or(""));
			}

			builder = builder.proxy(upstream);
		}

		Ok(builder)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ProviderHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn handle(&self) -> Self::Handle {
		ReqwestHandle(self.0.clone())
	}
}

/// [`AsyncHttpClient`] adapter returned by [`ReqwestHttpClient::handle`].
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Parses a `Retry-After` header expressed either as delta-seconds or an HTTP date.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).ok()?));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
