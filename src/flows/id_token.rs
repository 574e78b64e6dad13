//! ID token verification against the provider's published signing keys.
//!
//! Keys are fetched from the JWKS endpoint and cached for the configured TTL. A token whose `kid`
//! is missing from the cache triggers at most one refetch per `jwks_min_refetch_secs`; concurrent
//! misses queue on a single async lock and reuse whatever key set the first of them fetched.

// crates.io
use jsonwebtoken::{
	Algorithm, DecodingKey, Validation,
	jwk::{Jwk, JwkSet},
};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	error::IdTokenError,
	flows::{Broker, require_non_empty},
	http::ProviderHttpClient,
	oauth::{self, TransportErrorMapper},
	obs::{self, FlowKind},
	provider::Endpoint,
};

/// `aud` claim, which may be a single value or a list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
	/// Single audience string.
	Single(String),
	/// Audience list.
	Multiple(Vec<String>),
}
impl Audience {
	/// `true` when `client_id` is among the audiences.
	pub fn contains(&self, client_id: &str) -> bool {
		match self {
			Audience::Single(aud) => aud == client_id,
			Audience::Multiple(auds) => auds.iter().any(|aud| aud == client_id),
		}
	}
}

/// Verified ID token claims.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdTokenClaims {
	/// Issuer.
	pub iss: String,
	/// Subject.
	pub sub: String,
	/// Audience.
	pub aud: Audience,
	/// Expiry (seconds since the epoch).
	pub exp: i64,
	/// Issued-at (seconds since the epoch).
	#[serde(default)]
	pub iat: Option<i64>,
	/// Not-before (seconds since the epoch).
	#[serde(default)]
	pub nbf: Option<i64>,
	/// Nonce echoed from the authorization request.
	#[serde(default)]
	pub nonce: Option<String>,
	/// Authentication context class reference.
	#[serde(default)]
	pub acr: Option<String>,
	/// Authentication methods used.
	#[serde(default)]
	pub amr: Option<Vec<String>>,
	/// Remaining claims.
	#[serde(flatten)]
	pub extra: BTreeMap<String, Value>,
}

/// Shared signing-key cache.
#[derive(Debug)]
pub(crate) struct JwksCache {
	state: RwLock<Option<CachedKeys>>,
	refetch: AsyncMutex<()>,
}
impl JwksCache {
	fn lookup(&self, kid: &str, now: OffsetDateTime, ttl: Duration) -> (Option<Jwk>, u64) {
		match self.state.read().as_ref() {
			Some(cached) if now - cached.fetched_at < ttl =>
				(cached.keys.find(kid).cloned(), cached.generation),
			Some(cached) => (None, cached.generation),
			None => (None, 0),
		}
	}

	/// `true` when a fresh key set was fetched less than `min_interval` ago.
	fn recently_fetched(&self, now: OffsetDateTime, ttl: Duration, min_interval: Duration) -> bool {
		self.state.read().as_ref().is_some_and(|cached| {
			let age = now - cached.fetched_at;

			age < ttl && age < min_interval
		})
	}

	fn store(&self, keys: JwkSet, fetched_at: OffsetDateTime) -> u64 {
		let mut state = self.state.write();
		let generation = state.as_ref().map(|cached| cached.generation + 1).unwrap_or(1);

		*state = Some(CachedKeys { keys, fetched_at, generation });

		generation
	}
}
impl Default for JwksCache {
	fn default() -> Self {
		Self { state: RwLock::new(None), refetch: AsyncMutex::new(()) }
	}
}

#[derive(Debug)]
struct CachedKeys {
	keys: JwkSet,
	fetched_at: OffsetDateTime,
	generation: u64,
}

impl<C, M> Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Verifies an ID token's signature, issuer, audience, lifetime, and (optionally) nonce.
	pub async fn validate_id_token(
		&self,
		id_token: &str,
		expected_nonce: Option<&str>,
	) -> Result<IdTokenClaims> {
		obs::observe(FlowKind::IdToken, "validate_id_token", async move {
			require_non_empty("id_token", id_token)?;

			let header =
				jsonwebtoken::decode_header(id_token).map_err(IdTokenError::MalformedHeader)?;

			ensure_asymmetric(header.alg)?;

			let kid = header.kid.ok_or(IdTokenError::MissingKeyId)?;
			let jwk = self.signing_key(&kid).await?;
			let key = DecodingKey::from_jwk(&jwk)
				.map_err(|source| IdTokenError::InvalidKey { kid: kid.clone(), source })?;
			let config = self.config();
			let mut validation = Validation::new(header.alg);

			validation.set_issuer(&[config.expected_issuer()]);
			validation.set_audience(&[config.client_id.as_str()]);
			validation.leeway = config.id_token.leeway_secs;
			validation.validate_nbf = true;

			let claims = jsonwebtoken::decode::<IdTokenClaims>(id_token, &key, &validation)
				.map_err(IdTokenError::Rejected)?
				.claims;

			if expected_nonce.is_some_and(|expected| claims.nonce.as_deref() != Some(expected)) {
				return Err(IdTokenError::NonceMismatch.into());
			}

			Ok(claims)
		})
		.await
	}

	async fn signing_key(&self, kid: &str) -> Result<Jwk> {
		let settings = &self.config().id_token;
		let ttl = secs(settings.jwks_cache_ttl_secs);
		let min_interval = secs(settings.jwks_min_refetch_secs);
		let (cached, seen_generation) = self.jwks.lookup(kid, OffsetDateTime::now_utc(), ttl);

		if let Some(jwk) = cached {
			return Ok(jwk);
		}

		let _refetch = self.jwks.refetch.lock().await;
		let now = OffsetDateTime::now_utc();
		let (cached, generation) = self.jwks.lookup(kid, now, ttl);
		let unknown = || -> Error { IdTokenError::UnknownKey { kid: kid.to_owned() }.into() };

		// Another caller refreshed the set while this one waited.
		if generation != seen_generation {
			return cached.ok_or_else(unknown);
		}
		if self.jwks.recently_fetched(now, ttl, min_interval) {
			return Err(unknown());
		}

		let keys = self.fetch_jwks().await?;
		let found = keys.find(kid).cloned();

		self.jwks.store(keys, OffsetDateTime::now_utc());

		found.ok_or_else(unknown)
	}

	async fn fetch_jwks(&self) -> Result<JwkSet> {
		let url = &self.endpoints().jwks;

		obs::log_provider_url(self.config().enable_logging, Endpoint::Jwks, url);

		self.call(Endpoint::Jwks).json(oauth::plain_get(url)?).await
	}
}

fn secs(value: u64) -> Duration {
	Duration::seconds(i64::try_from(value).unwrap_or(i64::MAX))
}

fn ensure_asymmetric(algorithm: Algorithm) -> Result<(), IdTokenError> {
	match algorithm {
		Algorithm::RS256
		| Algorithm::RS384
		| Algorithm::RS512
		| Algorithm::PS256
		| Algorithm::PS384
		| Algorithm::PS512
		| Algorithm::ES256
		| Algorithm::ES384
		| Algorithm::EdDSA => Ok(()),
		algorithm => Err(IdTokenError::UnsupportedAlgorithm { algorithm }),
	}
}
