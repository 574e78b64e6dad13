//! Identity profile returned by the userinfo endpoint.

// crates.io
use serde_json::Value;
// self
use crate::{_prelude::*, auth::UserTypeAllowlist};

/// Profile attributes keyed as the provider emits them.
///
/// Keys the broker does not model are preserved in [`UserProfile::extensions`] so newer provider
/// attributes survive a round-trip.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
	/// Subject identifier.
	#[serde(default)]
	pub sub: String,
	/// Provider-wide user UUID.
	#[serde(default)]
	pub uuid: String,
	/// Account level, e.g. `SOP3`.
	#[serde(default, rename = "userType")]
	pub user_type: String,
	/// Profile category.
	#[serde(default, rename = "profileType", skip_serializing_if = "Option::is_none")]
	pub profile_type: Option<String>,
	/// Emirates ID number.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub idn: Option<String>,
	/// Unified government identifier.
	#[serde(default, rename = "unifiedID", skip_serializing_if = "Option::is_none")]
	pub unified_id: Option<String>,
	/// Identity document type.
	#[serde(default, rename = "idType", skip_serializing_if = "Option::is_none")]
	pub id_type: Option<String>,
	/// Service-provider scoped UUID.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub spuuid: Option<String>,
	/// Given name (English).
	#[serde(default, rename = "firstnameEN")]
	pub first_name_en: String,
	/// Family name (English).
	#[serde(default, rename = "lastnameEN")]
	pub last_name_en: String,
	/// Full name (English).
	#[serde(default, rename = "fullnameEN")]
	pub full_name_en: String,
	/// Given name (Arabic).
	#[serde(default, rename = "firstnameAR", skip_serializing_if = "Option::is_none")]
	pub first_name_ar: Option<String>,
	/// Family name (Arabic).
	#[serde(default, rename = "lastnameAR", skip_serializing_if = "Option::is_none")]
	pub last_name_ar: Option<String>,
	/// Full name (Arabic).
	#[serde(default, rename = "fullnameAR", skip_serializing_if = "Option::is_none")]
	pub full_name_ar: Option<String>,
	/// Title (English).
	#[serde(default, rename = "titleEN", skip_serializing_if = "Option::is_none")]
	pub title_en: Option<String>,
	/// Title (Arabic).
	#[serde(default, rename = "titleAR", skip_serializing_if = "Option::is_none")]
	pub title_ar: Option<String>,
	/// Verified email address.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Verified mobile number.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mobile: Option<String>,
	/// Gender.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub gender: Option<String>,
	/// Nationality (English).
	#[serde(default, rename = "nationalityEN", skip_serializing_if = "Option::is_none")]
	pub nationality_en: Option<String>,
	/// Nationality (Arabic).
	#[serde(default, rename = "nationalityAR", skip_serializing_if = "Option::is_none")]
	pub nationality_ar: Option<String>,
	/// Authentication context class reference.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub acr: Option<String>,
	/// Authentication methods used.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub amr: Option<Vec<String>>,
	/// Attributes not modeled above.
	#[serde(flatten)]
	pub extensions: BTreeMap<String, Value>,
}
impl UserProfile {
	/// Emirates ID, or `None` when absent or empty.
	pub fn emirates_id(&self) -> Option<&str> {
		self.idn.as_deref().filter(|idn| !idn.trim().is_empty())
	}

	/// `true` when the user type is allowlisted and an Emirates ID is present.
	pub fn is_authenticated_with(&self, allowlist: &UserTypeAllowlist) -> bool {
		allowlist.is_supported(&self.user_type) && self.emirates_id().is_some()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn unknown_keys_land_in_extensions() {
		let profile: UserProfile =
			serde_json::from_str(r#"{"sub":"x","idn":"784-1990-1234567-1","newField":"z"}"#)
				.expect("Profile should deserialize.");

		assert_eq!(profile.emirates_id(), Some("784-1990-1234567-1"));
		assert_eq!(profile.extensions.get("newField"), Some(&Value::String("z".into())));
		assert!(!profile.extensions.contains_key("idn"));
	}

	#[test]
	fn provider_keys_map_to_fields() {
		let profile: UserProfile = serde_json::from_str(
			r#"{"sub":"s","userType":"SOP3","fullnameEN":"Jane Doe","fullnameAR":"جين",
			"unifiedID":"u-1","nationalityEN":"ARE","amr":["urn:uae:pin"]}"#,
		)
		.expect("Profile should deserialize.");

		assert_eq!(profile.user_type, "SOP3");
		assert_eq!(profile.full_name_en, "Jane Doe");
		assert_eq!(profile.unified_id.as_deref(), Some("u-1"));
		assert_eq!(profile.nationality_en.as_deref(), Some("ARE"));
		assert_eq!(profile.amr, Some(vec!["urn:uae:pin".into()]));
		assert!(profile.extensions.is_empty());
	}

	#[test]
	fn authentication_requires_allowlisted_type_and_emirates_id() {
		let allowlist = UserTypeAllowlist::default();
		let mut profile = UserProfile {
			sub: "s".into(),
			user_type: "sop2".into(),
			idn: Some("784-1990-1234567-1".into()),
			..Default::default()
		};

		assert!(profile.is_authenticated_with(&allowlist));

		profile.idn = Some(String::new());

		assert!(profile.emirates_id().is_none());
		assert!(!profile.is_authenticated_with(&allowlist));

		profile.idn = Some("784-1990-1234567-1".into());
		profile.user_type = "VISITOR".into();

		assert!(!profile.is_authenticated_with(&allowlist));
	}
}
