//! Optional observability helpers for broker flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `uaepass_broker.flow` with the `flow`
//!   (operation) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `uaepass_broker_flow_total` counter for every
//!   attempt/success/failure (labeled by `flow` + `outcome`), count failures by error kind, and
//!   record per-endpoint provider request counts and latencies.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Broker operations observed by spans and counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Authorization URL construction.
	Authorization,
	/// Authorization code exchange.
	CodeExchange,
	/// Refresh token grant.
	Refresh,
	/// Profile retrieval.
	UserInfo,
	/// Logout URL construction.
	Logout,
	/// ID token verification (including JWKS retrieval).
	IdToken,
	/// Full callback orchestration.
	Callback,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Authorization => "authorization",
			FlowKind::CodeExchange => "code_exchange",
			FlowKind::Refresh => "refresh",
			FlowKind::UserInfo => "userinfo",
			FlowKind::Logout => "logout",
			FlowKind::IdToken => "id_token",
			FlowKind::Callback => "callback",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a broker helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a flow span, recording attempt and outcome counters around it.
pub(crate) async fn observe<T, Fut>(kind: FlowKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = FlowSpan::new(kind, stage);

	record_flow_outcome(kind, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;

	record_result(kind, &result);

	result
}

/// Runs a synchronous flow step inside an entered span with outcome counters.
pub(crate) fn observe_sync<T>(
	kind: FlowKind,
	stage: &'static str,
	f: impl FnOnce() -> Result<T>,
) -> Result<T> {
	let _guard = FlowSpan::new(kind, stage).entered();

	record_flow_outcome(kind, FlowOutcome::Attempt);

	let result = f();

	record_result(kind, &result);

	result
}

fn record_result<T>(kind: FlowKind, result: &Result<T>) {
	match result {
		Ok(_) => record_flow_outcome(kind, FlowOutcome::Success),
		Err(e) => {
			record_flow_outcome(kind, FlowOutcome::Failure);
			record_flow_failure(kind, e);
		},
	}
}
