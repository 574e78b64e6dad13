// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome},
	provider::Endpoint,
};

/// Counter of operation attempts and outcomes, labeled by `flow` and `outcome`.
pub const FLOW_TOTAL: &str = "uaepass_broker_flow_total";
/// Counter of failed operations, labeled by `flow` and `error` (see [`Error::kind`]).
pub const FLOW_FAILURES_TOTAL: &str = "uaepass_broker_flow_failures_total";
/// Counter of provider HTTP calls, labeled by `endpoint` and `status` class.
pub const PROVIDER_REQUESTS_TOTAL: &str = "uaepass_broker_provider_requests_total";
/// Histogram of provider HTTP call latency in seconds, labeled by `endpoint`.
pub const PROVIDER_REQUEST_SECONDS: &str = "uaepass_broker_provider_request_duration_seconds";

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(FLOW_TOTAL, "flow" => kind.as_str(), "outcome" => outcome.as_str())
		.increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Counts a failed operation under the error's stable kind label.
pub fn record_flow_failure(kind: FlowKind, error: &Error) {
	#[cfg(feature = "metrics")]
	metrics::counter!(FLOW_FAILURES_TOTAL, "flow" => kind.as_str(), "error" => error.kind())
		.increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, error);
}

/// Records one provider round trip. `status` is `None` when no response arrived.
pub fn record_provider_response(endpoint: Endpoint, status: Option<u16>, elapsed: StdDuration) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			PROVIDER_REQUESTS_TOTAL,
			"endpoint" => endpoint.as_str(),
			"status" => status_class(status)
		)
		.increment(1);
		metrics::histogram!(PROVIDER_REQUEST_SECONDS, "endpoint" => endpoint.as_str())
			.record(elapsed.as_secs_f64());
	}

	#[cfg(not(feature = "metrics"))]
	let _ = (endpoint, status, elapsed);
}

/// Collapses an HTTP status into the label used by [`PROVIDER_REQUESTS_TOTAL`].
pub fn status_class(status: Option<u16>) -> &'static str {
	match status {
		None => "transport_error",
		Some(200..=299) => "2xx",
		Some(300..=399) => "3xx",
		Some(400..=499) => "4xx",
		Some(500..=599) => "5xx",
		Some(_) => "other",
	}
}
