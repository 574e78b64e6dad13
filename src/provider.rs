//! Provider endpoint layout.
//!
//! Every provider URL derives from the configured base URL: the identity hub exposes its
//! browser and back-channel endpoints under `/idshub`. Endpoints are kept as plain strings
//! because the authorization and token calls append raw, unencoded query strings.

// self
use crate::{_prelude::*, config::ClientConfig};

/// Provider endpoints touched by the broker; used as labels in errors and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
	/// Browser authorization endpoint.
	Authorize,
	/// Token endpoint (code exchange and refresh).
	Token,
	/// User profile endpoint.
	UserInfo,
	/// Browser logout endpoint.
	Logout,
	/// Signing key set.
	Jwks,
}
impl Endpoint {
	/// Returns a stable label suitable for span fields and error messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			Endpoint::Authorize => "authorize",
			Endpoint::Token => "token",
			Endpoint::UserInfo => "userinfo",
			Endpoint::Logout => "logout",
			Endpoint::Jwks => "jwks",
		}
	}
}
impl Display for Endpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Absolute endpoint URLs for one provider deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// `{base}/idshub/authorize`.
	pub authorize: String,
	/// `{base}/idshub/token`.
	pub token: String,
	/// `{base}/idshub/userinfo`.
	pub userinfo: String,
	/// `{base}/idshub/logout`.
	pub logout: String,
	/// `{base}{jwks_path}`.
	pub jwks: String,
}
impl ProviderEndpoints {
	/// Derives the endpoint set from a base URL (trailing slashes ignored) and JWKS path.
	pub fn from_base_url(base_url: &str, jwks_path: &str) -> Self {
		let base = base_url.trim_end_matches('/');
		let jwks_path = jwks_path.trim();
		let jwks = if jwks_path.starts_with('/') {
			format!("{base}{jwks_path}")
		} else {
			format!("{base}/{jwks_path}")
		};

		Self {
			authorize: format!("{base}/idshub/authorize"),
			token: format!("{base}/idshub/token"),
			userinfo: format!("{base}/idshub/userinfo"),
			logout: format!("{base}/idshub/logout"),
			jwks,
		}
	}

	/// Derives the endpoint set from a validated client configuration.
	pub fn from_config(config: &ClientConfig) -> Self {
		Self::from_base_url(config.effective_base_url(), &config.id_token.jwks_path)
	}

	/// Returns the URL for `endpoint`.
	pub fn url(&self, endpoint: Endpoint) -> &str {
		match endpoint {
			Endpoint::Authorize => &self.authorize,
			Endpoint::Token => &self.token,
			Endpoint::UserInfo => &self.userinfo,
			Endpoint::Logout => &self.logout,
			Endpoint::Jwks => &self.jwks,
		}
	}
}
