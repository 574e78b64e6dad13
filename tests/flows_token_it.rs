#![cfg(feature = "reqwest")]

// std
use std::time::Duration as StdDuration;
// crates.io
use httpmock::prelude::*;
// self
use uaepass_broker::{
	config::ClientConfig,
	error::{Error, ProtocolError, TransportError},
	flows::ReqwestBroker,
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::Endpoint,
};

const CLIENT_ID: &str = "sandbox_stage";
const CLIENT_SECRET: &str = "sandbox_stage_secret";
const REDIRECT_URI: &str = "https://app.example.com/callback";
const BASIC_CREDENTIALS: &str = "Basic c2FuZGJveF9zdGFnZTpzYW5kYm94X3N0YWdlX3NlY3JldA==";

fn mock_config(server: &MockServer, timeout_secs: u64) -> ClientConfig {
	ClientConfig::builder(CLIENT_ID)
		.client_secret(CLIENT_SECRET)
		.redirect_uri(REDIRECT_URI)
		.base_url(server.base_url())
		.timeout_secs(timeout_secs)
		.build()
		.expect("Client configuration should validate for the mock provider.")
}

// The mock provider serves a self-signed certificate.
fn broker_for(config: ClientConfig) -> ReqwestBroker {
	let client = ReqwestHttpClient::client_builder(&config)
		.expect("Reqwest builder should accept the mock configuration.")
		.danger_accept_invalid_certs(true)
		.build()
		.expect("Reqwest client should build for the mock provider.");

	ReqwestBroker::with_http_client(
		config,
		ReqwestHttpClient::with_client(client),
		ReqwestTransportErrorMapper,
	)
}

fn build_broker(server: &MockServer) -> ReqwestBroker {
	broker_for(mock_config(server, 30))
}

#[tokio::test]
async fn exchange_code_posts_raw_query_with_basic_auth() {
	let server = MockServer::start_async().await;
	let broker = build_broker(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/idshub/token")
				.query_param("grant_type", "authorization_code")
				.query_param("redirect_uri", REDIRECT_URI)
				.query_param("code", "auth-code-1")
				.header("authorization", BASIC_CREDENTIALS)
				.header("accept", "application/json");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"abc\",\"token_type\":\"Bearer\",\"expires_in\":3600,\"refresh_token\":\"r1\"}",
			);
		})
		.await;
	let tokens = broker
		.exchange_code("auth-code-1", "state-1")
		.await
		.expect("Code exchange should succeed.");

	mock.assert_async().await;

	assert_eq!(tokens.access_token.expose(), "abc");
	assert_eq!(tokens.token_type, "Bearer");
	assert_eq!(tokens.expires_in, 3600);
	assert_eq!(tokens.refresh_token.as_ref().map(|secret| secret.expose()), Some("r1"));
}

#[tokio::test]
async fn exchange_code_rejects_empty_access_token() {
	let server = MockServer::start_async().await;
	let broker = build_broker(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/idshub/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"\"}");
		})
		.await;
	let err = broker
		.exchange_code("auth-code-2", "state-2")
		.await
		.expect_err("An empty access token must be refused.");

	mock.assert_calls_async(1).await;

	assert!(matches!(
		err,
		Error::Protocol(ProtocolError::MissingField {
			endpoint: Endpoint::Token,
			field: "access_token"
		})
	));
}

#[tokio::test]
async fn exchange_code_surfaces_provider_rejection() {
	let server = MockServer::start_async().await;
	let broker = build_broker(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/idshub/token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\"}");
		})
		.await;
	let err = broker
		.exchange_code("auth-code-3", "state-3")
		.await
		.expect_err("A 401 must fail the exchange.");

	mock.assert_async().await;

	match err {
		Error::Upstream { endpoint, status, oauth_error, .. } => {
			assert_eq!(endpoint, Endpoint::Token);
			assert_eq!(status, 401);
			assert_eq!(oauth_error.as_deref(), Some("invalid_client"));
		},
		other => panic!("Unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn exchange_code_reports_malformed_body() {
	let server = MockServer::start_async().await;
	let broker = build_broker(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/idshub/token");
			then.status(200).header("content-type", "text/html").body("<html>maintenance</html>");
		})
		.await;
	let err = broker
		.exchange_code("auth-code-4", "state-4")
		.await
		.expect_err("Non-JSON bodies must fail.");

	mock.assert_async().await;

	assert!(matches!(err, Error::Protocol(ProtocolError::Parse { endpoint: Endpoint::Token, .. })));
}

#[tokio::test]
async fn blank_inputs_fail_without_network_calls() {
	let server = MockServer::start_async().await;
	let broker = build_broker(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/idshub/token");
			then.status(200).body("{\"access_token\":\"never\"}");
		})
		.await;

	assert!(matches!(
		broker.exchange_code("", "state").await,
		Err(Error::InvalidArgument { argument: "code", .. })
	));
	assert!(matches!(
		broker.exchange_code("code", "").await,
		Err(Error::InvalidArgument { argument: "state", .. })
	));
	assert!(matches!(
		broker.refresh_token("").await,
		Err(Error::InvalidArgument { argument: "refresh_token", .. })
	));

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn refresh_token_posts_refresh_grant() {
	let server = MockServer::start_async().await;
	let broker = build_broker(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/idshub/token")
				.query_param("grant_type", "refresh_token")
				.query_param("refresh_token", "refresh-1")
				.header("authorization", BASIC_CREDENTIALS);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"rotated\",\"token_type\":\"Bearer\",\"expires_in\":1800,\"refresh_token\":\"refresh-2\"}",
			);
		})
		.await;
	let tokens = broker.refresh_token("refresh-1").await.expect("Refresh should succeed.");

	mock.assert_async().await;

	assert_eq!(tokens.access_token.expose(), "rotated");
	assert_eq!(tokens.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-2"));
}

#[tokio::test]
async fn refresh_token_rejection_carries_oauth_error() {
	let server = MockServer::start_async().await;
	let broker = build_broker(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/idshub/token");
			then.status(400)
				.header("content-type", "application/json")
				.header("retry-after", "5")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"expired\"}");
		})
		.await;
	let err = broker.refresh_token("stale").await.expect_err("Invalid grant must fail.");

	mock.assert_async().await;

	match err {
		Error::Upstream { status, oauth_error, retry_after, .. } => {
			assert_eq!(status, 400);
			assert_eq!(oauth_error.as_deref(), Some("invalid_grant"));
			assert_eq!(retry_after, Some(time::Duration::seconds(5)));
		},
		other => panic!("Unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn values_unfit_for_the_raw_query_are_caller_faults() {
	let server = MockServer::start_async().await;
	let broker = build_broker(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/idshub/token");
			then.status(200).body("{\"access_token\":\"never\"}");
		})
		.await;
	let err = broker
		.exchange_code("abc def", "state")
		.await
		.expect_err("A code with a space cannot be sent raw.");

	assert!(matches!(err, Error::InvalidArgument { argument: "code", .. }));
	assert!(err.is_client_fault());

	let err = broker
		.refresh_token("r1&grant_type=password")
		.await
		.expect_err("A refresh token cannot smuggle extra parameters.");

	assert!(matches!(err, Error::InvalidArgument { argument: "refresh_token", .. }));
	assert!(err.is_client_fault());

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn whitespace_state_still_allows_the_exchange() {
	let server = MockServer::start_async().await;
	let broker = build_broker(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/idshub/token").query_param("code", "auth-code-5");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"abc\"}");
		})
		.await;

	broker.exchange_code("auth-code-5", " ").await.expect("A blank-looking state is still present.");

	mock.assert_async().await;
}

#[tokio::test]
async fn slow_provider_hits_the_configured_timeout() {
	let server = MockServer::start_async().await;
	let broker = broker_for(mock_config(&server, 1));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/idshub/token");
			then.status(200)
				.header("content-type", "application/json")
				.delay(StdDuration::from_secs(3))
				.body("{\"access_token\":\"late\"}");
		})
		.await;
	let err = broker
		.exchange_code("auth-code-6", "state-6")
		.await
		.expect_err("A response slower than the timeout must fail.");

	mock.assert_async().await;

	assert!(matches!(err, Error::Transport(TransportError::Timeout { endpoint: Endpoint::Token })));
	assert!(!err.is_client_fault());
}
