//! Token endpoint response model.

pub mod secret;

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Successful token endpoint payload for both code exchange and refresh.
///
/// Keys are snake_case per the provider contract. `token_type` and `expires_in` default when the
/// provider omits them; an absent `access_token` deserializes as empty so callers can reject it
/// as a contract violation instead of a parse error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
	/// Bearer credential for the profile endpoint.
	#[serde(default)]
	pub access_token: TokenSecret,
	/// Token type, usually `Bearer`.
	#[serde(default)]
	pub token_type: String,
	/// Lifetime in seconds (`0` when the provider omits it).
	#[serde(default)]
	pub expires_in: u64,
	/// Granted scope.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	/// Refresh credential, when issued.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// OIDC ID token (compact JWS), when issued.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token: Option<TokenSecret>,
	/// State echoed by the provider.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
}
impl TokenResponse {
	/// Absolute expiry computed from the instant the response was received.
	pub fn expires_at(&self, issued_at: OffsetDateTime) -> OffsetDateTime {
		let secs = i64::try_from(self.expires_in).unwrap_or(i64::MAX);

		issued_at.saturating_add(Duration::seconds(secs))
	}
}
