//! Identity-domain models: identifiers, token responses, user profiles, and user-type policy.

pub mod id;
pub mod profile;
pub mod token;
pub mod user_type;

pub use id::*;
pub use profile::*;
pub use token::{secret::*, *};
pub use user_type::*;
