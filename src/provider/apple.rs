//! Sign in with Apple adapter contract.

// self
use crate::{
	_prelude::*,
	auth::Secret,
	provider::{ProviderError, ProviderFuture},
};

/// Native "Sign in with Apple" call.
///
/// Implementations generate a [`NoncePair`](crate::auth::NoncePair), pass the hashed value to
/// `ASAuthorizationAppleIDRequest.nonce`, and return the raw value in [`AppleIdentity::nonce`].
pub trait AppleSignIn: Send + Sync {
	/// Presents the native sheet and resolves with the provider result.
	fn sign_in(&self) -> ProviderFuture<'_, AppleIdentity>;
}

/// Result of a native Apple sign-in.
///
/// Every field is optional because the SDK may omit any of them; the coordinator rejects results
/// without a token or nonce.
#[derive(Clone, Debug, Default)]
pub struct AppleIdentity {
	/// Compact identity token.
	pub identity_token: Option<Secret>,
	/// Raw nonce whose digest was sent to Apple.
	pub nonce: Option<Secret>,
	/// Stable Apple user identifier.
	pub user_id: Option<String>,
	/// Email, only shared on the first authorization.
	pub email: Option<String>,
	/// Display name, only shared on the first authorization.
	pub full_name: Option<String>,
}
impl AppleIdentity {
	/// Builds a result from a token and its raw nonce.
	pub fn new(identity_token: impl Into<Secret>, nonce: impl Into<Secret>) -> Self {
		Self {
			identity_token: Some(identity_token.into()),
			nonce: Some(nonce.into()),
			..Default::default()
		}
	}
}

/// Adapter for platforms without Sign in with Apple (e.g. Android builds).
#[derive(Clone, Debug, Default)]
pub struct UnsupportedAppleSignIn;
impl AppleSignIn for UnsupportedAppleSignIn {
	fn sign_in(&self) -> ProviderFuture<'_, AppleIdentity> {
		Box::pin(async {
			Err(ProviderError::new(
				crate::provider::Provider::Apple,
				"Sign in with Apple is not available on this device.",
			)
			.with_code("UNSUPPORTED"))
		})
	}
}
