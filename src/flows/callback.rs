//! Login orchestration: redirect issuance and callback completion.
//!
//! [`Broker::begin_login`] records a [`PendingAttempt`] under a fresh [`AttemptId`] and returns the
//! authorization URL. [`Broker::complete_login`] consumes that attempt, verifies the returned
//! `state`, and only then touches the token endpoint.

// self
use crate::{
	_prelude::*,
	auth::{AttemptId, UserProfile},
	flows::{Broker, generate_nonce, generate_state},
	http::ProviderHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind},
	store::{AttemptStore, PendingAttempt},
};

/// Query parameters delivered to the redirect URI.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackParams {
	/// Authorization code.
	#[serde(default)]
	pub code: Option<String>,
	/// Echoed state.
	#[serde(default)]
	pub state: Option<String>,
	/// OAuth error code when the user declined or the provider failed.
	#[serde(default)]
	pub error: Option<String>,
	/// Human-readable error detail.
	#[serde(default)]
	pub error_description: Option<String>,
}

/// Redirect issued by [`Broker::begin_login`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginRedirect {
	/// Key the caller must hand back to [`Broker::complete_login`] (typically via a cookie).
	pub attempt_id: AttemptId,
	/// Provider authorization URL to send the browser to.
	pub authorize_url: String,
}

/// Identity established by a successful login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
	/// Verified Emirates ID.
	pub emirates_id: String,
	/// Account level.
	pub user_type: String,
	/// Full name (English).
	pub full_name_en: String,
	/// Full name (Arabic).
	pub full_name_ar: Option<String>,
	/// Email address.
	pub email: Option<String>,
	/// Mobile number.
	pub mobile: Option<String>,
	/// When the login completed.
	#[serde(with = "time::serde::rfc3339")]
	pub logged_in_at: OffsetDateTime,
}
impl AuthenticatedUser {
	fn from_profile(profile: UserProfile, emirates_id: String, now: OffsetDateTime) -> Self {
		Self {
			emirates_id,
			user_type: profile.user_type,
			full_name_en: profile.full_name_en,
			full_name_ar: profile.full_name_ar,
			email: profile.email,
			mobile: profile.mobile,
			logged_in_at: now,
		}
	}
}

impl<C, M> Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Starts a login: stores a pending attempt and returns where to send the browser.
	pub async fn begin_login(&self, store: &dyn AttemptStore) -> Result<LoginRedirect> {
		let state = generate_state();
		let nonce = generate_nonce();
		let request = self.authorization_request(state.as_str()).with_nonce(nonce.as_str());
		let authorize_url = self.authorization_url(&request)?;
		let attempt_id = AttemptId::generate();
		let attempt = PendingAttempt::new(&state, Some(nonce), OffsetDateTime::now_utc());

		store.save(attempt_id.clone(), attempt).await?;

		Ok(LoginRedirect { attempt_id, authorize_url })
	}

	/// Completes a login from the redirect parameters.
	///
	/// The pending attempt is removed up front, so every callback is single-use whatever its
	/// outcome. A missing, expired, or mismatched attempt fails with [`Error::StateMismatch`]
	/// before any provider call.
	pub async fn complete_login(
		&self,
		store: &dyn AttemptStore,
		attempt_id: &AttemptId,
		params: CallbackParams,
	) -> Result<AuthenticatedUser> {
		obs::observe(FlowKind::Callback, "complete_login", async move {
			let attempt = store.take(attempt_id).await?;

			if let Some(error) = params.error.filter(|error| !error.is_empty()) {
				return Err(Error::AuthorizationDenied {
					error,
					description: params.error_description,
				});
			}

			let code = params.code.filter(|code| !code.is_empty());
			let state = params.state.filter(|state| !state.is_empty());
			let (Some(code), Some(state)) = (code, state) else {
				return Err(Error::invalid_argument("callback", "missing code or state"));
			};
			let now = OffsetDateTime::now_utc();
			let attempt = attempt
				.filter(|attempt| !attempt.is_expired_at(now) && attempt.matches_state(&state))
				.ok_or(Error::StateMismatch)?;
			let tokens = self.exchange_code(&code, &state).await?;

			if let Some(id_token) = tokens.id_token.as_ref().filter(|_| self.config().id_token.verify)
			{
				self.validate_id_token(id_token.expose(), attempt.nonce.as_deref()).await?;
			}

			let profile = self.fetch_profile(tokens.access_token.expose()).await?;

			if !self.config().supported_user_types.is_supported(&profile.user_type) {
				return Err(Error::UnsupportedUserType { user_type: profile.user_type });
			}

			let emirates_id = profile.emirates_id().ok_or(Error::MissingEmiratesId)?.to_owned();

			#[cfg(feature = "tracing")]
			tracing::info!(user_type = %profile.user_type, "Login completed.");

			Ok(AuthenticatedUser::from_profile(profile, emirates_id, OffsetDateTime::now_utc()))
		})
		.await
	}
}
