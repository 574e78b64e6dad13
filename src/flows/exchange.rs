//! Authorization code exchange.

// self
use crate::{
	_prelude::*,
	auth::TokenResponse,
	error::ProtocolError,
	flows::{Broker, require_non_empty, require_query_value},
	http::ProviderHttpClient,
	oauth::{self, TransportErrorMapper},
	obs::{self, FlowKind},
	provider::Endpoint,
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges an authorization code for tokens.
	///
	/// Sends one `POST {base}/idshub/token` with the grant parameters in the raw query string and
	/// client Basic auth. `state` must be present (it proves the caller ran the CSRF check) but is
	/// not transmitted. A 2xx response without an access token is a protocol violation. A `code`
	/// holding whitespace, controls, or query separators fails with [`Error::InvalidArgument`].
	pub async fn exchange_code(&self, code: &str, state: &str) -> Result<TokenResponse> {
		obs::observe(FlowKind::CodeExchange, "exchange_code", async move {
			require_query_value("code", code)?;
			require_non_empty("state", state)?;

			let config = self.config();
			let token_url = &self.endpoints().token;
			let url = format!(
				"{token_url}?grant_type=authorization_code&redirect_uri={}&code={code}",
				config.redirect_uri
			);

			obs::log_provider_url(config.enable_logging, Endpoint::Token, token_url);

			let request = oauth::basic_auth_post(&url, &config.client_id, &config.client_secret)?;

			self.token_call(request).await
		})
		.await
	}

	pub(crate) async fn token_call(&self, request: oauth2::HttpRequest) -> Result<TokenResponse> {
		let response: TokenResponse = self.call(Endpoint::Token).json(request).await?;

		if response.access_token.is_empty() {
			return Err(ProtocolError::MissingField {
				endpoint: Endpoint::Token,
				field: "access_token",
			}
			.into());
		}

		Ok(response)
	}
}
