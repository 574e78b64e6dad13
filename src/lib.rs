//! UAE PASS relying-party client: raw authorization URLs, Basic-auth'd code exchange,
//! Bearer-auth'd profile retrieval, ID token verification against the provider JWKS, and an
//! optional demo login flow with a file-backed page-analytics collector.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod analytics;
pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
#[cfg(feature = "server")] pub mod server;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::ClientConfig, flows::Broker, http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
	};

	/// Broker type alias used by reqwest-backed integration tests.
	pub type ReqwestTestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Client identifier baked into [`test_client_config`].
	pub const TEST_CLIENT_ID: &str = "sandbox_stage";
	/// Client secret baked into [`test_client_config`].
	pub const TEST_CLIENT_SECRET: &str = "sandbox_stage_secret";
	/// Redirect URI baked into [`test_client_config`].
	pub const TEST_REDIRECT_URI: &str = "https://app.example.com/callback";

	/// Builds a reqwest HTTP client that honors `config` but accepts the self-signed certificates
	/// produced by `httpmock` during tests.
	pub fn test_reqwest_http_client(config: &ClientConfig) -> ReqwestHttpClient {
		let client = ReqwestHttpClient::client_builder(config)
			.expect("Test client configuration should produce a Reqwest builder.")
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Validated client configuration pointing at the provided mock base URL.
	pub fn test_client_config(base_url: &str) -> ClientConfig {
		ClientConfig::builder(TEST_CLIENT_ID)
			.client_secret(TEST_CLIENT_SECRET)
			.redirect_uri(TEST_REDIRECT_URI)
			.base_url(base_url)
			.enable_logging(true)
			.build()
			.expect("Test client configuration should validate.")
	}

	/// Constructs a [`Broker`] backed by the reqwest transport used across integration tests.
	pub fn build_reqwest_test_broker(config: ClientConfig) -> ReqwestTestBroker {
		let http_client = test_reqwest_http_client(&config);

		Broker::with_http_client(config, http_client, ReqwestTransportErrorMapper)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		path::{Path, PathBuf},
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {axum_test as _, color_eyre as _, httpmock as _, tokio as _};
