//! Provider call facade: request construction, dispatch through the transport seam, and
//! response classification into the broker error taxonomy.

pub use oauth2;

// std
use std::time::Instant;
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{Method, Request, header},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, ProtocolError, TransportError},
	http::{self, ProviderHttpClient},
	obs,
	provider::Endpoint,
};

/// Maps HTTP transport failures into broker [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a broker error.
	fn map_transport_error(&self, endpoint: Endpoint, error: HttpClientError<E>) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, endpoint: Endpoint, err: HttpClientError<ReqwestError>) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(endpoint, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) =>
				TransportError::network(endpoint, std::io::Error::other(message)).into(),
			_ => TransportError::network(
				endpoint,
				std::io::Error::other("unrecognized HTTP client failure"),
			)
			.into(),
		}
	}
}

/// Borrowed view over a transport + mapper pair used for a single provider call.
pub(crate) struct ProviderCall<'a, C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: &'a C,
	mapper: &'a M,
	endpoint: Endpoint,
}
impl<'a, C, M> ProviderCall<'a, C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(http_client: &'a C, mapper: &'a M, endpoint: Endpoint) -> Self {
		Self { http_client, mapper, endpoint }
	}

	/// Dispatches `request` and returns the body of a 2xx response parsed as `T`.
	pub(crate) async fn json<T>(&self, request: HttpRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.send(request).await?;
		let response = ensure_success(self.endpoint, response)?;

		parse_json(self.endpoint, &response)
	}

	async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
		let handle = self.http_client.handle();
		let started = Instant::now();
		let result = handle.call(request).await;

		obs::record_provider_response(
			self.endpoint,
			result.as_ref().ok().map(|response| response.status().as_u16()),
			started.elapsed(),
		);

		result.map_err(|e| self.mapper.map_transport_error(self.endpoint, e))
	}
}

#[derive(Deserialize)]
struct OAuthErrorBody {
	error: String,
}

/// `POST {url}` with client Basic auth and an empty body.
pub(crate) fn basic_auth_post(
	url: &str,
	client_id: &str,
	client_secret: &str,
) -> Result<HttpRequest> {
	let credentials = STANDARD.encode(format!("{client_id}:{client_secret}"));

	build_request(Method::POST, url, format!("Basic {credentials}"))
}

/// `GET {url}` with a Bearer credential.
pub(crate) fn bearer_get(url: &str, access_token: &str) -> Result<HttpRequest> {
	build_request(Method::GET, url, format!("Bearer {access_token}"))
}

/// Unauthenticated `GET {url}`.
pub(crate) fn plain_get(url: &str) -> Result<HttpRequest> {
	Request::builder()
		.method(Method::GET)
		.uri(url)
		.header(header::ACCEPT, "application/json")
		.body(Vec::new())
		.map_err(|e| ConfigError::from(e).into())
}

fn build_request(method: Method, url: &str, authorization: String) -> Result<HttpRequest> {
	Request::builder()
		.method(method)
		.uri(url)
		.header(header::AUTHORIZATION, authorization)
		.header(header::ACCEPT, "application/json")
		.body(Vec::new())
		.map_err(|e| ConfigError::from(e).into())
}

/// Passes 2xx responses through; everything else becomes [`Error::Upstream`].
pub(crate) fn ensure_success(endpoint: Endpoint, response: HttpResponse) -> Result<HttpResponse> {
	let status = response.status();

	if status.is_success() {
		return Ok(response);
	}

	let body = String::from_utf8_lossy(response.body()).into_owned();
	let oauth_error =
		serde_json::from_slice::<OAuthErrorBody>(response.body()).ok().map(|parsed| parsed.error);
	let retry_after = http::parse_retry_after(response.headers());

	#[cfg(feature = "tracing")]
	tracing::error!(
		endpoint = endpoint.as_str(),
		status = status.as_u16(),
		body = %body,
		"Provider call failed."
	);

	Err(Error::Upstream { endpoint, status: status.as_u16(), body, oauth_error, retry_after })
}

/// Parses a JSON body, reporting the failing path on mismatch.
pub(crate) fn parse_json<T>(endpoint: Endpoint, response: &HttpResponse) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(response.body());

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| ProtocolError::Parse { endpoint, source }.into())
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(endpoint: Endpoint, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransportError::Timeout { endpoint }.into();
	}

	TransportError::network(endpoint, err).into()
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::{HeaderValue, StatusCode};
	// self
	use super::*;

	fn response(status: StatusCode, body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() = status;

		response
	}

	#[test]
	fn basic_auth_header_encodes_credentials() {
		let request = basic_auth_post("https://id.example.ae/idshub/token?code=abc", "id", "secret")
			.expect("Token request should build.");

		assert_eq!(request.method(), Method::POST);
		assert_eq!(
			request.headers().get(header::AUTHORIZATION),
			Some(&HeaderValue::from_static("Basic aWQ6c2VjcmV0"))
		);
		assert_eq!(request.uri().query(), Some("code=abc"));
		assert!(request.body().is_empty());
	}

	#[test]
	fn non_success_becomes_upstream_error_with_oauth_code() {
		let mut failed = response(
			StatusCode::UNAUTHORIZED,
			r#"{"error":"invalid_client","error_description":"bad secret"}"#,
		);

		failed.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from_static("30"));

		let err = ensure_success(Endpoint::Token, failed).expect_err("401 must fail.");

		match err {
			Error::Upstream { endpoint, status, oauth_error, retry_after, body } => {
				assert_eq!(endpoint, Endpoint::Token);
				assert_eq!(status, 401);
				assert_eq!(oauth_error.as_deref(), Some("invalid_client"));
				assert_eq!(retry_after, Some(Duration::seconds(30)));
				assert!(body.contains("bad secret"));
			},
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	#[test]
	fn parse_failure_reports_json_path() {
		#[derive(Debug, Deserialize)]
		struct Body {
			#[allow(dead_code)]
			expires_in: u64,
		}

		let body = response(StatusCode::OK, r#"{"expires_in":"soon"}"#);
		let err =
			parse_json::<Body>(Endpoint::Token, &body).expect_err("String lifetime must fail.");

		match err {
			Error::Protocol(ProtocolError::Parse { endpoint, source }) => {
				assert_eq!(endpoint, Endpoint::Token);
				assert_eq!(source.path().to_string(), "expires_in");
			},
			other => panic!("Unexpected error: {other:?}"),
		}
	}
}
