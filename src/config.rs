//! Relying-party configuration: provider environment, client credentials, transport knobs, and
//! ID token verification settings.
//!
//! Configuration is either assembled in code through [`ClientConfig::builder`] or loaded with
//! [`ClientConfig::load`] from a YAML/TOML/JSON file layered with `UAEPASS__*` environment
//! overrides (for example `UAEPASS__CLIENT_SECRET` or `UAEPASS__ID_TOKEN__VERIFY`). Both paths
//! run [`ClientConfig::validate`] before handing the value out.

// std
use std::{net::IpAddr, time::Duration as StdDuration};
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, auth::UserTypeAllowlist, error::ConfigError, flows};

/// Default scope requested from the provider.
pub const DEFAULT_SCOPE: &str = "urn:uae:digitalid:profile:general";
/// Default authentication-level hint sent as `acr_values`.
pub const DEFAULT_ACR_VALUES: &str = "urn:safelayer:tws:policies:authentication:level:low";
/// Environment variable prefix consumed by [`ClientConfig::load`].
pub const ENV_PREFIX: &str = "UAEPASS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Provider deployment the client talks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
	/// Sandbox used during onboarding.
	#[default]
	Staging,
	/// Live national identity service.
	Production,
}
impl Environment {
	/// Base URL used when no explicit `base_url` is configured.
	pub const fn default_base_url(self) -> &'static str {
		match self {
			Environment::Staging => "https://staging-id.uaepass.ae",
			Environment::Production => "https://id.uaepass.ae",
		}
	}
}

/// Outbound HTTP proxy for enterprise networks.
#[derive(Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
	/// Proxy URL, e.g. `http://proxy.internal:3128`.
	pub url: String,
	/// Optional proxy username.
	#[serde(default)]
	pub username: Option<String>,
	/// Optional proxy password.
	#[serde(default)]
	pub password: Option<String>,
}
impl Debug for ProxyConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProxyConfig")
			.field("url", &self.url)
			.field("username", &self.username)
			.field("password_set", &self.password.is_some())
			.finish()
	}
}

/// ID token verification knobs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdTokenSettings {
	/// Verify `id_token` values returned from the token endpoint during login.
	pub verify: bool,
	/// Expected `iss` claim; defaults to the effective base URL.
	pub issuer: Option<String>,
	/// JWKS path appended to the base URL.
	pub jwks_path: String,
	/// How long fetched signing keys are trusted before a refetch.
	pub jwks_cache_ttl_secs: u64,
	/// Minimum spacing between key-set fetches triggered by an unknown `kid`.
	pub jwks_min_refetch_secs: u64,
	/// Clock skew tolerated for `exp`/`nbf`.
	pub leeway_secs: u64,
}
impl Default for IdTokenSettings {
	fn default() -> Self {
		Self {
			verify: true,
			issuer: None,
			jwks_path: "/idshub/jwks".into(),
			jwks_cache_ttl_secs: 3_600,
			jwks_min_refetch_secs: 30,
			leeway_secs: 60,
		}
	}
}

/// Client configuration shared by every broker operation.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Provider deployment; selects the default base URL.
	#[serde(default)]
	pub environment: Environment,
	/// Explicit provider base URL; empty means [`Environment::default_base_url`].
	#[serde(default)]
	pub base_url: String,
	/// Client identifier issued during onboarding.
	pub client_id: String,
	/// Client secret issued during onboarding.
	#[serde(default)]
	pub client_secret: String,
	/// Registered redirect URI.
	#[serde(default)]
	pub redirect_uri: String,
	/// Requested scope string.
	#[serde(default = "default_scope")]
	pub scope: String,
	/// OAuth response type; only `code` is accepted.
	#[serde(default = "default_response_type")]
	pub response_type: String,
	/// Authentication-level hint sent with every authorization request.
	#[serde(default = "default_acr_values")]
	pub acr_values: String,
	/// Optional outbound proxy.
	#[serde(default)]
	pub proxy: Option<ProxyConfig>,
	/// Per-request timeout in seconds.
	#[serde(default = "default_timeout_secs")]
	pub timeout_secs: u64,
	/// Emit debug events carrying request URLs.
	#[serde(default)]
	pub enable_logging: bool,
	/// User types allowed to complete a login.
	#[serde(default)]
	pub supported_user_types: UserTypeAllowlist,
	/// ID token verification settings.
	#[serde(default)]
	pub id_token: IdTokenSettings,
}
impl ClientConfig {
	/// Starts a builder seeded with defaults for the provided client identifier.
	pub fn builder(client_id: impl Into<String>) -> ClientConfigBuilder {
		ClientConfigBuilder::new(client_id)
	}

	/// Loads configuration from `path` (format inferred from the extension) layered with
	/// `UAEPASS__*` environment overrides, then validates it.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let config: Self = load_layered(path.as_ref(), ENV_PREFIX)?;

		config.validate()?;

		Ok(config)
	}

	/// Validates required settings and URL shapes.
	pub fn validate(&self) -> Result<(), ConfigError> {
		require("client_id", &self.client_id)?;
		require("client_secret", &self.client_secret)?;
		require("redirect_uri", &self.redirect_uri)?;

		Url::parse(&self.redirect_uri)
			.map_err(|source| ConfigError::InvalidUrl { field: "redirect_uri", source })?;

		if !flows::is_query_safe(&self.redirect_uri) {
			return Err(ConfigError::UnsafeQueryValue { field: "redirect_uri" });
		}

		let base = Url::parse(self.effective_base_url())
			.map_err(|source| ConfigError::InvalidUrl { field: "base_url", source })?;

		if base.scheme() != "https" && !is_loopback(&base) {
			return Err(ConfigError::InsecureBaseUrl { url: base.to_string() });
		}
		if self.response_type != "code" {
			return Err(ConfigError::UnsupportedResponseType {
				response_type: self.response_type.clone(),
			});
		}
		if self.timeout_secs == 0 {
			return Err(ConfigError::InvalidTimeout);
		}
		if let Some(proxy) = &self.proxy {
			Url::parse(&proxy.url)
				.map_err(|source| ConfigError::InvalidUrl { field: "proxy.url", source })?;
		}

		Ok(())
	}

	/// Base URL actually used for provider calls, without a trailing slash.
	pub fn effective_base_url(&self) -> &str {
		let configured = self.base_url.trim();

		if configured.is_empty() {
			self.environment.default_base_url()
		} else {
			configured.trim_end_matches('/')
		}
	}

	/// Expected `iss` claim for ID tokens.
	pub fn expected_issuer(&self) -> &str {
		self.id_token.issuer.as_deref().unwrap_or_else(|| self.effective_base_url())
	}

	/// Per-request timeout.
	pub fn timeout(&self) -> StdDuration {
		StdDuration::from_secs(self.timeout_secs)
	}
}
impl Debug for ClientConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientConfig")
			.field("environment", &self.environment)
			.field("base_url", &self.effective_base_url())
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("redirect_uri", &self.redirect_uri)
			.field("scope", &self.scope)
			.field("proxy", &self.proxy)
			.field("timeout_secs", &self.timeout_secs)
			.field("enable_logging", &self.enable_logging)
			.field("supported_user_types", &self.supported_user_types)
			.field("id_token", &self.id_token)
			.finish()
	}
}

/// Builder for [`ClientConfig`].
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
	config: ClientConfig,
}
impl ClientConfigBuilder {
	fn new(client_id: impl Into<String>) -> Self {
		Self {
			config: ClientConfig {
				environment: Environment::default(),
				base_url: String::new(),
				client_id: client_id.into(),
				client_secret: String::new(),
				redirect_uri: String::new(),
				scope: default_scope(),
				response_type: default_response_type(),
				acr_values: default_acr_values(),
				proxy: None,
				timeout_secs: DEFAULT_TIMEOUT_SECS,
				enable_logging: false,
				supported_user_types: UserTypeAllowlist::default(),
				id_token: IdTokenSettings::default(),
			},
		}
	}

	/// Sets the provider environment.
	pub fn environment(mut self, environment: Environment) -> Self {
		self.config.environment = environment;

		self
	}

	/// Overrides the provider base URL.
	pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
		self.config.base_url = base_url.into();

		self
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.config.client_secret = secret.into();

		self
	}

	/// Sets the registered redirect URI.
	pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
		self.config.redirect_uri = redirect_uri.into();

		self
	}

	/// Overrides the requested scope.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.config.scope = scope.into();

		self
	}

	/// Overrides the response type (validation only accepts `code`).
	pub fn response_type(mut self, response_type: impl Into<String>) -> Self {
		self.config.response_type = response_type.into();

		self
	}

	/// Overrides the `acr_values` hint.
	pub fn acr_values(mut self, acr_values: impl Into<String>) -> Self {
		self.config.acr_values = acr_values.into();

		self
	}

	/// Routes provider calls through a proxy.
	pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
		self.config.proxy = Some(proxy);

		self
	}

	/// Sets the per-request timeout in seconds.
	pub fn timeout_secs(mut self, secs: u64) -> Self {
		self.config.timeout_secs = secs;

		self
	}

	/// Toggles debug URL logging.
	pub fn enable_logging(mut self, enabled: bool) -> Self {
		self.config.enable_logging = enabled;

		self
	}

	/// Replaces the user-type allowlist.
	pub fn supported_user_types(mut self, allowlist: UserTypeAllowlist) -> Self {
		self.config.supported_user_types = allowlist;

		self
	}

	/// Replaces the ID token settings.
	pub fn id_token(mut self, settings: IdTokenSettings) -> Self {
		self.config.id_token = settings;

		self
	}

	/// Validates and returns the configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		self.config.validate()?;

		Ok(self.config)
	}
}

/// Reads a configuration file layered with `{prefix}__*` environment overrides.
pub(crate) fn load_layered<T>(path: &Path, prefix: &str) -> Result<T, ConfigError>
where
	T: DeserializeOwned,
{
	let settings = ::config::Config::builder()
		.add_source(::config::File::from(path))
		.add_source(::config::Environment::with_prefix(prefix).separator("__"))
		.build()?;

	Ok(settings.try_deserialize()?)
}

fn require(field: &'static str, value: &str) -> Result<(), ConfigError> {
	if value.trim().is_empty() { Err(ConfigError::MissingField { field }) } else { Ok(()) }
}

fn is_loopback(url: &Url) -> bool {
	match url.host_str() {
		Some("localhost") => true,
		Some(host) => host
			.trim_start_matches('[')
			.trim_end_matches(']')
			.parse::<IpAddr>()
			.map(|ip| ip.is_loopback())
			.unwrap_or(false),
		None => false,
	}
}

fn default_scope() -> String {
	DEFAULT_SCOPE.into()
}

fn default_response_type() -> String {
	"code".into()
}

fn default_acr_values() -> String {
	DEFAULT_ACR_VALUES.into()
}

fn default_timeout_secs() -> u64 {
	DEFAULT_TIMEOUT_SECS
}
