//! Authorization URL construction.
//!
//! The identity hub expects the authorization query verbatim: values are concatenated without
//! percent-encoding, in a fixed order. Callers must therefore only pass URL-safe values.

// self
use crate::{
	_prelude::*,
	auth::id,
	flows::{Broker, require_non_empty},
	http::ProviderHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind},
	provider::Endpoint,
};

const STATE_LEN: usize = 32;
const NONCE_LEN: usize = 32;

/// Parameters of one authorization redirect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationRequest {
	/// Client identifier.
	pub client_id: String,
	/// Always `code`.
	pub response_type: String,
	/// Registered redirect URI.
	pub redirect_uri: String,
	/// Requested scope.
	pub scope: String,
	/// Per-attempt CSRF token; must be non-empty and unpredictable.
	pub state: String,
	/// Authentication-level hint; omitted when `None` or empty.
	pub acr_values: Option<String>,
	/// OIDC nonce bound into the ID token.
	pub nonce: Option<String>,
	/// OIDC `prompt` (e.g. `login`).
	pub prompt: Option<String>,
	/// Preferred UI languages (e.g. `ar`).
	pub ui_locales: Option<String>,
}
impl AuthorizationRequest {
	/// Attaches a nonce.
	pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
		self.nonce = Some(nonce.into());

		self
	}

	/// Attaches a `prompt` value.
	pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
		self.prompt = Some(prompt.into());

		self
	}

	/// Attaches a `ui_locales` value.
	pub fn with_ui_locales(mut self, ui_locales: impl Into<String>) -> Self {
		self.ui_locales = Some(ui_locales.into());

		self
	}

	/// Replaces the `acr_values` hint.
	pub fn with_acr_values(mut self, acr_values: impl Into<String>) -> Self {
		self.acr_values = Some(acr_values.into());

		self
	}

	fn query(&self) -> String {
		let mut pairs = vec![
			("response_type", self.response_type.as_str()),
			("client_id", self.client_id.as_str()),
			("scope", self.scope.as_str()),
			("state", self.state.as_str()),
			("redirect_uri", self.redirect_uri.as_str()),
		];
		let optional = [
			("acr_values", &self.acr_values),
			("nonce", &self.nonce),
			("prompt", &self.prompt),
			("ui_locales", &self.ui_locales),
		];

		for (key, value) in optional {
			if let Some(value) = value.as_deref().filter(|value| !value.is_empty()) {
				pairs.push((key, value));
			}
		}

		pairs.iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>().join("&")
	}
}

/// Returns a fresh 32-character alphanumeric state token.
pub fn generate_state() -> String {
	id::random_token(STATE_LEN)
}

/// Returns a fresh 32-character alphanumeric nonce.
pub fn generate_nonce() -> String {
	id::random_token(NONCE_LEN)
}

impl<C, M> Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Pre-fills an [`AuthorizationRequest`] with the configured client settings.
	pub fn authorization_request(&self, state: impl Into<String>) -> AuthorizationRequest {
		let config = self.config();

		AuthorizationRequest {
			client_id: config.client_id.clone(),
			response_type: config.response_type.clone(),
			redirect_uri: config.redirect_uri.clone(),
			scope: config.scope.clone(),
			state: state.into(),
			acr_values: Some(config.acr_values.clone()),
			nonce: None,
			prompt: None,
			ui_locales: None,
		}
	}

	/// Builds `{base}/idshub/authorize?...` with unencoded parameters.
	///
	/// Fails with [`Error::InvalidArgument`] when `state` is empty.
	pub fn authorization_url(&self, request: &AuthorizationRequest) -> Result<String> {
		obs::observe_sync(FlowKind::Authorization, "authorization_url", || {
			require_non_empty("state", &request.state)?;

			let url = format!("{}?{}", self.endpoints().authorize, request.query());

			obs::log_provider_url(self.config().enable_logging, Endpoint::Authorize, &url);

			Ok(url)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	fn broker() -> ReqwestTestBroker {
		build_reqwest_test_broker(test_client_config("https://id.example.ae/"))
	}

	#[test]
	fn url_lists_parameters_in_order_without_encoding() {
		let broker = broker();
		let request = broker.authorization_request("abc123");
		let url = broker.authorization_url(&request).expect("Non-empty state should succeed.");

		assert_eq!(
			url,
			"https://id.example.ae/idshub/authorize?response_type=code&client_id=sandbox_stage\
			 &scope=urn:uae:digitalid:profile:general&state=abc123\
			 &redirect_uri=https://app.example.com/callback\
			 &acr_values=urn:safelayer:tws:policies:authentication:level:low"
		);
	}

	#[test]
	fn optional_parameters_follow_acr_values() {
		let broker = broker();
		let request = broker
			.authorization_request("s")
			.with_nonce("n1")
			.with_prompt("login")
			.with_ui_locales("ar");
		let url = broker.authorization_url(&request).expect("Request should build.");

		assert!(url.ends_with("&nonce=n1&prompt=login&ui_locales=ar"));
	}

	#[test]
	fn empty_optional_parameters_are_omitted() {
		let broker = broker();
		let request = broker.authorization_request("s").with_prompt("").with_acr_values("");
		let url = broker.authorization_url(&request).expect("Request should build.");

		assert!(!url.contains("prompt="));
		assert!(!url.contains("acr_values="));
		assert!(url.ends_with("&redirect_uri=https://app.example.com/callback"));
	}

	#[test]
	fn empty_state_is_rejected() {
		let broker = broker();
		let err = broker
			.authorization_url(&broker.authorization_request(""))
			.expect_err("Empty state must fail.");

		assert!(matches!(err, Error::InvalidArgument { argument: "state", .. }));
	}

	#[test]
	fn whitespace_state_is_passed_through() {
		let broker = broker();
		let url = broker
			.authorization_url(&broker.authorization_request(" "))
			.expect("Whitespace is still a non-empty state.");

		assert!(url.contains("&state= &redirect_uri="));
	}

	#[test]
	fn redirect_uri_is_raw_here_but_encoded_on_logout() {
		let broker = broker();
		let authorize = broker
			.authorization_url(&broker.authorization_request("s"))
			.expect("Request should build.");
		let logout = broker.logout_url(Some(TEST_REDIRECT_URI));

		assert!(authorize.contains("&redirect_uri=https://app.example.com/callback"));
		assert!(logout.ends_with("?redirect_uri=https%3A%2F%2Fapp.example.com%2Fcallback"));
	}

	#[test]
	fn generated_tokens_are_unique_alphanumerics() {
		let first = generate_state();

		assert_eq!(first.len(), 32);
		assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(first, generate_state());
		assert_ne!(generate_nonce(), generate_nonce());
	}
}
