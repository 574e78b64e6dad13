//! Demo web surface: UAE PASS login, session profile, and the page-analytics API.
//!
//! Enabled by the `server` feature. Pending logins live in a [`MemoryAttemptStore`] keyed by the
//! `uaepass_attempt` cookie; signed-in users live in an in-memory session map keyed by the
//! `uaepass_session` cookie.

mod collect;
mod cookie;
mod login;

// std
use std::net::SocketAddr;
// crates.io
use axum::{Router, routing::get};
use color_eyre::eyre::WrapErr;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
// self
use crate::{
	_prelude::*,
	analytics::FileAnalyticsStore,
	auth::SessionId,
	config::{self, ClientConfig},
	error::ConfigError,
	flows::{AuthenticatedUser, ReqwestBroker},
	store::{AttemptStore, MemoryAttemptStore},
};

/// Environment prefix for demo server overrides (`UAEPASS_DEMO__UAEPASS__CLIENT_ID=...`).
pub const SERVER_ENV_PREFIX: &str = "UAEPASS_DEMO";
/// Lifetime of a signed-in demo session.
pub const SESSION_TTL: Duration = Duration::hours(8);

const DEFAULT_LOG_DIRECTIVES: &str = "uaepass_broker=info,tower_http=info";
const PURGE_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

/// Demo server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
	/// Listen address.
	#[serde(default = "default_bind_addr")]
	pub bind_addr: SocketAddr,
	/// Where the provider sends the browser after logout.
	#[serde(default)]
	pub logout_redirect_url: Option<String>,
	/// Analytics document location.
	#[serde(default = "default_data_file")]
	pub data_file: PathBuf,
	/// Relying-party client settings.
	pub uaepass: ClientConfig,
}
impl ServerConfig {
	/// Loads settings from `path` layered with `UAEPASS_DEMO__*` environment overrides.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let config: Self = config::load_layered(path.as_ref(), SERVER_ENV_PREFIX)?;

		config.uaepass.validate()?;

		Ok(config)
	}
}

/// Shared handler state; clones share every store.
#[derive(Clone, Debug)]
pub struct AppState {
	broker: ReqwestBroker,
	attempts: MemoryAttemptStore,
	sessions: Arc<RwLock<HashMap<SessionId, AuthenticatedUser>>>,
	analytics: FileAnalyticsStore,
	logout_redirect_url: Option<String>,
}
impl AppState {
	/// Wires the handler state from its parts.
	pub fn new(
		broker: ReqwestBroker,
		analytics: FileAnalyticsStore,
		logout_redirect_url: Option<String>,
	) -> Self {
		Self {
			broker,
			attempts: MemoryAttemptStore::default(),
			sessions: Default::default(),
			analytics,
			logout_redirect_url,
		}
	}

	/// Builds the broker and analytics store described by `config`.
	pub fn from_config(config: ServerConfig) -> Result<Self> {
		let broker = ReqwestBroker::new(config.uaepass)?;
		let analytics = FileAnalyticsStore::open(config.data_file)?;

		Ok(Self::new(broker, analytics, config.logout_redirect_url))
	}

	/// Pending-login store.
	pub fn attempts(&self) -> &MemoryAttemptStore {
		&self.attempts
	}

	/// Number of stored sessions, including expired ones not yet purged.
	pub fn session_count(&self) -> usize {
		self.sessions.read().len()
	}

	/// Drops sessions older than [`SESSION_TTL`] and returns how many were removed.
	pub fn purge_expired_sessions(&self, now: OffsetDateTime) -> usize {
		let mut sessions = self.sessions.write();
		let before = sessions.len();

		sessions.retain(|_, user| now - user.logged_in_at < SESSION_TTL);

		before - sessions.len()
	}

	fn secure_cookies(&self) -> bool {
		self.broker.config().redirect_uri.starts_with("https://")
	}

	fn session(&self, id: &SessionId, now: OffsetDateTime) -> Option<AuthenticatedUser> {
		self.sessions
			.read()
			.get(id)
			.filter(|user| now - user.logged_in_at < SESSION_TTL)
			.cloned()
	}
}

/// Builds the demo router.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(login::index))
		.route("/login", get(login::login))
		.route("/callback", get(login::callback))
		.route("/profile", get(login::profile))
		.route("/logout", get(login::logout))
		.nest("/api/DataCollection", collect::router())
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `uaepass_broker=info,tower_http=info`.
pub fn init_tracing() {
	let env_filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVES));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(fmt::layer().with_target(true).with_level(true))
		.init();
}

/// Binds `config.bind_addr` and serves the demo until Ctrl-C.
pub async fn serve(config: ServerConfig) -> color_eyre::Result<()> {
	let bind_addr = config.bind_addr;
	let state = AppState::from_config(config).wrap_err("Failed to initialize demo state")?;

	spawn_purge(state.clone());

	let listener = tokio::net::TcpListener::bind(bind_addr)
		.await
		.wrap_err_with(|| format!("Failed to bind {bind_addr}"))?;

	tracing::info!(addr = %bind_addr, "Demo server listening.");

	axum::serve(listener, router(state))
		.with_graceful_shutdown(shutdown_signal())
		.await
		.wrap_err("Demo server terminated unexpectedly")?;

	Ok(())
}

fn spawn_purge(state: AppState) {
	tokio::spawn(async move {
		let mut interval = tokio::time::interval(PURGE_INTERVAL);

		loop {
			interval.tick().await;

			let now = OffsetDateTime::now_utc();

			match state.attempts.purge_expired(now).await {
				Ok(0) => {},
				Ok(purged) => tracing::debug!(purged, "Purged expired login attempts."),
				Err(e) => tracing::warn!(error = %e, "Failed to purge login attempts."),
			}

			let purged = state.purge_expired_sessions(now);

			if purged > 0 {
				tracing::debug!(purged, "Purged expired sessions.");
			}
		}
	});
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "Failed to listen for shutdown signal.");
	}

	tracing::info!("Shutting down demo server.");
}

fn default_bind_addr() -> SocketAddr {
	SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_data_file() -> PathBuf {
	PathBuf::from("data-collection/user-data.json")
}
