//! Account-level allowlist applied after the profile fetch.

// self
use crate::_prelude::*;

/// User types accepted when no allowlist is configured.
pub const DEFAULT_SUPPORTED_USER_TYPES: [&str; 3] = ["SOP3", "SOP2", "SOP1"];

/// Case-insensitive set of accepted user types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserTypeAllowlist(Vec<String>);
impl UserTypeAllowlist {
	/// Builds an allowlist from the provided user types.
	pub fn new<I, S>(user_types: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self(user_types.into_iter().map(Into::into).collect())
	}

	/// `true` when `user_type` matches an entry, ignoring ASCII case. Empty input never matches.
	pub fn is_supported(&self, user_type: &str) -> bool {
		!user_type.is_empty() && self.0.iter().any(|allowed| allowed.eq_ignore_ascii_case(user_type))
	}

	/// Iterates over the configured entries.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}
}
impl Default for UserTypeAllowlist {
	fn default() -> Self {
		Self::new(DEFAULT_SUPPORTED_USER_TYPES)
	}
}

/// Checks `user_type` against [`DEFAULT_SUPPORTED_USER_TYPES`].
pub fn is_user_type_supported(user_type: &str) -> bool {
	!user_type.is_empty()
		&& DEFAULT_SUPPORTED_USER_TYPES.iter().any(|allowed| allowed.eq_ignore_ascii_case(user_type))
}
