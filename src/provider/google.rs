//! Google Sign-In adapter contract.

// self
use crate::{
	_prelude::*,
	auth::Secret,
	provider::{ProviderError, ProviderFuture},
};

/// Parameters for one Google sign-in attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoogleSignInRequest {
	/// iOS OAuth client identifier (unused on Android).
	pub ios_client_id: Option<String>,
	/// Web OAuth client identifier; Google mints the identity token for this audience.
	pub web_client_id: String,
	/// Caller-supplied correlation identifier echoed in diagnostics.
	pub request_id: String,
}
impl GoogleSignInRequest {
	/// Creates a request for the given web client and correlation id.
	pub fn new(web_client_id: impl Into<String>, request_id: impl Into<String>) -> Self {
		Self {
			ios_client_id: None,
			web_client_id: web_client_id.into(),
			request_id: request_id.into(),
		}
	}

	/// Sets the iOS client identifier.
	pub fn with_ios_client_id(mut self, ios_client_id: impl Into<String>) -> Self {
		self.ios_client_id = Some(ios_client_id.into());

		self
	}
}

/// Native Google Sign-In calls.
pub trait GoogleSignIn: Send + Sync {
	/// Presents the native account picker and resolves with the provider result.
	fn sign_in<'a>(
		&'a self,
		request: &'a GoogleSignInRequest,
	) -> ProviderFuture<'a, GoogleIdentity>;

	/// Clears the SDK's cached account. Failures are tolerated by the coordinator.
	fn sign_out(&self) -> ProviderFuture<'_, ()> {
		Box::pin(async { Ok(()) })
	}
}

/// Result of a native Google sign-in.
#[derive(Clone, Debug, Default)]
pub struct GoogleIdentity {
	/// Compact identity token.
	pub id_token: Option<Secret>,
	/// OAuth access token, when the SDK returns one.
	pub access_token: Option<Secret>,
	/// Raw nonce generated for this request, if any.
	pub raw_nonce: Option<Secret>,
	/// SHA-256 digest of [`GoogleIdentity::raw_nonce`] as sent to Google.
	pub raw_nonce_sha256: Option<String>,
	/// Google account identifier.
	pub user_id: Option<String>,
	/// Account email.
	pub email: Option<String>,
	/// Account display name.
	pub full_name: Option<String>,
}
impl GoogleIdentity {
	/// Builds a result carrying only an identity token.
	pub fn new(id_token: impl Into<Secret>) -> Self {
		Self { id_token: Some(id_token.into()), ..Default::default() }
	}

	/// Attaches the raw nonce (and its digest) used for the request.
	pub fn with_raw_nonce(mut self, raw_nonce: impl Into<String>) -> Self {
		let pair = crate::auth::NoncePair::from_raw(raw_nonce);

		self.raw_nonce_sha256 = Some(pair.sha256);
		self.raw_nonce = Some(pair.raw);

		self
	}
}

/// Adapter used when Google Sign-In is not compiled into the shell.
#[derive(Clone, Debug, Default)]
pub struct UnsupportedGoogleSignIn;
impl GoogleSignIn for UnsupportedGoogleSignIn {
	fn sign_in<'a>(
		&'a self,
		_request: &'a GoogleSignInRequest,
	) -> ProviderFuture<'a, GoogleIdentity> {
		Box::pin(async {
			Err(ProviderError::new(
				crate::provider::Provider::Google,
				"Google Sign-In is not available on this device.",
			)
			.with_code("UNSUPPORTED"))
		})
	}
}
