//! Refresh token grant.
//!
//! The broker never refreshes on its own; callers decide when a token needs renewal (for example
//! by comparing [`TokenResponse::expires_at`] against the clock).

// self
use crate::{
	_prelude::*,
	auth::TokenResponse,
	flows::{Broker, require_query_value},
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
	/// Redeems `refresh_token` for a new token set via `grant_type=refresh_token`.
	pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse> {
		obs::observe(FlowKind::Refresh, "refresh_token", async move {
			require_query_value("refresh_token", refresh_token)?;

			let config = self.config();
			let token_url = &self.endpoints().token;
			let url =
				format!("{token_url}?grant_type=refresh_token&refresh_token={refresh_token}");

			obs::log_provider_url(config.enable_logging, Endpoint::Token, token_url);

			let request = oauth::basic_auth_post(&url, &config.client_id, &config.client_secret)?;

			self.token_call(request).await
		})
		.await
	}
}
