//! Session tokens issued by the backend identity service.

// self
use crate::{_prelude::*, auth::Secret};

/// Access/refresh token pair produced by a successful identity-token exchange.
///
/// The pair serializes to `{"access_token": "..", "refresh_token": ".."}`, which is the exact
/// shape handed to the embedded content's session handler. Formatting never prints either
/// token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
	/// Short-lived access token.
	pub access_token: Secret,
	/// Refresh token used by the web client to renew the session.
	pub refresh_token: Secret,
}
impl SessionTokens {
	/// Creates a session from its two tokens.
	pub fn new(access_token: impl Into<Secret>, refresh_token: impl Into<Secret>) -> Self {
		Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
	}
}
impl Debug for SessionTokens {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionTokens")
			.field("access_token", &self.access_token)
			.field("refresh_token", &self.refresh_token)
			.finish()
	}
}
