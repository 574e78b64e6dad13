//! Profile retrieval.

// self
use crate::{
	_prelude::*,
	auth::UserProfile,
	error::ProtocolError,
	flows::{Broker, require_header_value},
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
	/// Fetches the signed-in user's profile with a Bearer access token.
	pub async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile> {
		obs::observe(FlowKind::UserInfo, "fetch_profile", async move {
			require_header_value("access_token", access_token)?;

			let url = &self.endpoints().userinfo;

			obs::log_provider_url(self.config().enable_logging, Endpoint::UserInfo, url);

			let request = oauth::bearer_get(url, access_token)?;
			let profile: UserProfile = self.call(Endpoint::UserInfo).json(request).await?;

			if profile.sub.is_empty() {
				return Err(
					ProtocolError::MissingField { endpoint: Endpoint::UserInfo, field: "sub" }.into()
				);
			}

			#[cfg(feature = "tracing")]
			tracing::debug!(user_type = %profile.user_type, "Retrieved user profile.");

			Ok(profile)
		})
		.await
	}
}
