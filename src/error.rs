//! Broker-level error types shared across flows, configuration, stores, and the demo server.

// self
use crate::{_prelude::*, provider::Endpoint};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Required caller input was missing or malformed; no network call was made.
	#[error("Invalid argument `{argument}`: {reason}.")]
	InvalidArgument {
		/// Name of the offending argument.
		argument: &'static str,
		/// Human-readable reason.
		reason: String,
	},
	/// Provider answered with a non-2xx status. Never retried by the broker.
	#[error("The {endpoint} endpoint returned HTTP {status}: {body}")]
	Upstream {
		/// Endpoint that produced the response.
		endpoint: Endpoint,
		/// HTTP status code.
		status: u16,
		/// Raw response body (lossy UTF-8).
		body: String,
		/// OAuth `error` code, when the body carried one.
		oauth_error: Option<String>,
		/// Retry-After hint supplied by the provider, for caller-side retry policies.
		retry_after: Option<Duration>,
	},
	/// Provider answered 2xx but violated the response contract.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// Callback state did not match (or outlived) the pending attempt; possible CSRF.
	#[error("Authorization state mismatch; the login attempt was discarded.")]
	StateMismatch,
	/// Provider redirected back with an OAuth error instead of a code.
	#[error("Authorization was denied by the identity provider: {error}.")]
	AuthorizationDenied {
		/// OAuth `error` code from the callback.
		error: String,
		/// Optional `error_description` from the callback.
		description: Option<String>,
	},
	/// Profile user type is outside the configured allowlist.
	#[error("User type `{user_type}` is not supported.")]
	UnsupportedUserType {
		/// User type reported by the provider.
		user_type: String,
	},
	/// Profile lacks the Emirates ID required to complete authentication.
	#[error("User profile does not carry a verified Emirates ID.")]
	MissingEmiratesId,
	/// ID token failed verification.
	#[error(transparent)]
	IdToken(#[from] IdTokenError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
}
impl Error {
	/// Shorthand for [`Error::InvalidArgument`].
	pub fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
		Self::InvalidArgument { argument, reason: reason.into() }
	}

	/// Stable snake_case label for metrics and logs.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::InvalidArgument { .. } => "invalid_argument",
			Self::Upstream { .. } => "upstream",
			Self::Protocol(_) => "protocol",
			Self::StateMismatch => "state_mismatch",
			Self::AuthorizationDenied { .. } => "authorization_denied",
			Self::UnsupportedUserType { .. } => "unsupported_user_type",
			Self::MissingEmiratesId => "missing_emirates_id",
			Self::IdToken(_) => "id_token",
			Self::Config(_) => "config",
			Self::Transport(_) => "transport",
			Self::Storage(_) => "storage",
		}
	}

	/// Returns `true` when the failure was caused by the caller or the browser round-trip
	/// (bad input, CSRF, denied consent, rejected identity) rather than by the provider or
	/// the local environment.
	pub fn is_client_fault(&self) -> bool {
		matches!(
			self,
			Self::InvalidArgument { .. }
				| Self::StateMismatch
				| Self::AuthorizationDenied { .. }
				| Self::UnsupportedUserType { .. }
				| Self::MissingEmiratesId
				| Self::IdToken(_)
		)
	}
}

/// 2xx responses that break the provider's JSON contract.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// Body could not be parsed into the expected shape.
	#[error("The {endpoint} endpoint returned malformed JSON.")]
	Parse {
		/// Endpoint that produced the body.
		endpoint: Endpoint,
		/// Structured parsing failure including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A required field was absent or empty.
	#[error("The {endpoint} endpoint response is missing `{field}`.")]
	MissingField {
		/// Endpoint that produced the body.
		endpoint: Endpoint,
		/// Field name.
		field: &'static str,
	},
}

/// ID token verification failures.
#[derive(Debug, ThisError)]
pub enum IdTokenError {
	/// Header could not be decoded.
	#[error("ID token header is malformed.")]
	MalformedHeader(#[source] jsonwebtoken::errors::Error),
	/// Header omitted the `kid` needed to select a signing key.
	#[error("ID token header does not name a signing key.")]
	MissingKeyId,
	/// Header requested an algorithm the broker refuses to verify with a public key set.
	#[error("ID token uses the unsupported algorithm {algorithm:?}.")]
	UnsupportedAlgorithm {
		/// Algorithm named in the header.
		algorithm: jsonwebtoken::Algorithm,
	},
	/// No JWKS entry matched the header `kid`, even after a refetch.
	#[error("No provider signing key matches kid `{kid}`.")]
	UnknownKey {
		/// Key identifier from the header.
		kid: String,
	},
	/// JWKS entry could not be turned into a verification key.
	#[error("Provider signing key `{kid}` is unusable.")]
	InvalidKey {
		/// Key identifier.
		kid: String,
		/// Underlying key conversion failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// Signature, issuer, audience, or lifetime checks failed.
	#[error("ID token failed verification.")]
	Rejected(#[source] jsonwebtoken::errors::Error),
	/// The `nonce` claim did not match the nonce issued with the authorization request.
	#[error("ID token nonce does not match the authorization request.")]
	NonceMismatch,
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Configuration sources could not be read or deserialized.
	#[error("Configuration could not be loaded.")]
	Load(#[from] ::config::ConfigError),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A required setting is empty.
	#[error("The `{field}` setting is required.")]
	MissingField {
		/// Setting name.
		field: &'static str,
	},
	/// A URL setting cannot be parsed.
	#[error("The `{field}` setting is not a valid URL.")]
	InvalidUrl {
		/// Setting name.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A setting sent verbatim in a raw query holds characters the query cannot carry.
	#[error("The `{field}` setting contains characters that cannot be sent in a raw query.")]
	UnsafeQueryValue {
		/// Setting name.
		field: &'static str,
	},
	/// The provider base URL must use HTTPS.
	#[error("The provider base URL must use HTTPS: {url}.")]
	InsecureBaseUrl {
		/// Offending URL.
		url: String,
	},
	/// Only the authorization-code response type is supported.
	#[error("Response type `{response_type}` is not supported; use `code`.")]
	UnsupportedResponseType {
		/// Configured response type.
		response_type: String,
	},
	/// Request timeout must be positive.
	#[error("The request timeout must be greater than zero.")]
	InvalidTimeout,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeouts).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint being called.
		endpoint: Endpoint,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The configured request timeout elapsed.
	#[error("Request to the {endpoint} endpoint timed out.")]
	Timeout {
		/// Endpoint being called.
		endpoint: Endpoint,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(endpoint: Endpoint, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn upstream_message_carries_status_and_body() {
		let err = Error::Upstream {
			endpoint: Endpoint::Token,
			status: 401,
			body: "{\"error\":\"invalid_client\"}".into(),
			oauth_error: Some("invalid_client".into()),
			retry_after: None,
		};
		let message = err.to_string();

		assert!(message.contains("401"));
		assert!(message.contains("invalid_client"));
		assert!(!err.is_client_fault());
	}

	#[test]
	fn csrf_and_input_failures_are_client_faults() {
		assert!(Error::StateMismatch.is_client_fault());
		assert!(Error::invalid_argument("state", "must not be empty").is_client_fault());
		assert!(Error::MissingEmiratesId.is_client_fault());
		assert!(!Error::from(ConfigError::InvalidTimeout).is_client_fault());
	}

	#[test]
	fn kinds_are_stable_labels() {
		assert_eq!(Error::StateMismatch.kind(), "state_mismatch");
		assert_eq!(Error::invalid_argument("code", "bad").kind(), "invalid_argument");
		assert_eq!(Error::from(ConfigError::InvalidTimeout).kind(), "config");
		assert_eq!(
			Error::from(TransportError::Timeout { endpoint: Endpoint::Token }).kind(),
			"transport"
		);
	}
}
