//! Relying-party operations exposed by [`Broker`].
//!
//! Each operation is a single, linear provider interaction: no retries, no token caching, and no
//! hidden state beyond the JWKS cache used by ID token verification. The login orchestrator in
//! [`callback`] composes them into the full redirect/callback sequence.

pub mod authorize;
pub mod callback;
pub mod exchange;
pub mod id_token;
pub mod logout;
pub mod refresh;
pub mod userinfo;

pub use authorize::*;
pub use callback::*;
pub use id_token::IdTokenClaims;

// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	flows::id_token::JwksCache,
	http::ProviderHttpClient,
	oauth::{ProviderCall, TransportErrorMapper},
	provider::{Endpoint, ProviderEndpoints},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Relying-party client bound to one provider deployment and one client registration.
///
/// Cloning is cheap; clones share the transport, configuration, and signing-key cache.
pub struct Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	config: Arc<ClientConfig>,
	endpoints: Arc<ProviderEndpoints>,
	jwks: Arc<JwksCache>,
}
impl<C, M> Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a broker that reuses the caller-provided transport + mapper pair.
	///
	/// `config` is expected to be validated (see [`ClientConfig::validate`]).
	pub fn with_http_client(
		config: ClientConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let endpoints = ProviderEndpoints::from_config(&config);

		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			config: Arc::new(config),
			endpoints: Arc::new(endpoints),
			jwks: Default::default(),
		}
	}

	/// Client configuration the broker was built with.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Provider endpoint URLs derived from the configuration.
	pub fn endpoints(&self) -> &ProviderEndpoints {
		&self.endpoints
	}

	pub(crate) fn call(&self, endpoint: Endpoint) -> ProviderCall<'_, C, M> {
		ProviderCall::new(self.http_client.as_ref(), self.transport_mapper.as_ref(), endpoint)
	}
}
#[cfg(feature = "reqwest")]
impl Broker<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Validates `config` and provisions a reqwest transport honoring its timeout and proxy.
	pub fn new(config: ClientConfig) -> Result<Self> {
		config.validate()?;

		let http_client = ReqwestHttpClient::from_config(&config)?;

		Ok(Self::with_http_client(config, http_client, ReqwestTransportErrorMapper))
	}
}
impl<C, M> Clone for Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			config: self.config.clone(),
			endpoints: self.endpoints.clone(),
			jwks: self.jwks.clone(),
		}
	}
}
impl<C, M> Debug for Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("base_url", &self.config.effective_base_url())
			.field("client_id", &self.config.client_id)
			.field("client_secret_set", &!self.config.client_secret.is_empty())
			.finish()
	}
}

pub(crate) fn require_non_empty(argument: &'static str, value: &str) -> Result<()> {
	if value.is_empty() {
		Err(Error::invalid_argument(argument, "must not be empty"))
	} else {
		Ok(())
	}
}

/// Rejects values that cannot ride verbatim in a raw query string.
pub(crate) fn require_query_value(argument: &'static str, value: &str) -> Result<()> {
	require_non_empty(argument, value)?;

	if is_query_safe(value) {
		Ok(())
	} else {
		Err(Error::invalid_argument(argument, "contains characters a raw query cannot carry"))
	}
}

/// Rejects values that cannot be sent as an HTTP header credential.
pub(crate) fn require_header_value(argument: &'static str, value: &str) -> Result<()> {
	require_non_empty(argument, value)?;

	if value.bytes().all(|b| b.is_ascii_graphic()) {
		Ok(())
	} else {
		Err(Error::invalid_argument(argument, "contains characters a header cannot carry"))
	}
}

/// `true` when every byte is printable ASCII outside the set that would split or break the query.
pub(crate) fn is_query_safe(value: &str) -> bool {
	value.bytes().all(|b| b.is_ascii_graphic() && !b"\"#&<>\\^`{|}".contains(&b))
}
