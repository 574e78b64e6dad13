//! Runs the demo login site.
//!
//! ```sh
//! cargo run --example demo_server --features server -- demos/demo.toml
//! ```
//!
//! Any setting can be overridden with `UAEPASS_DEMO__*` variables, e.g.
//! `UAEPASS_DEMO__UAEPASS__CLIENT_SECRET`.

// std
use std::env;
// crates.io
use color_eyre::{Result, eyre::WrapErr};
// self
use uaepass_broker::server::{self, ServerConfig};

// Relative to the package root, where `cargo run` starts.
const DEFAULT_CONFIG: &str = "demos/demo.toml";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	server::init_tracing();

	let path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.into());
	let config =
		ServerConfig::load(&path).wrap_err_with(|| format!("Failed to load configuration from {path}"))?;

	server::serve(config).await
}
