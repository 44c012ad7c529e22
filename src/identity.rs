//! Backend identity service contract.
//!
//! The bridge never validates identity-token signatures itself. It hands the token (and the
//! nonce, when one applies) to an identity service which either issues a session or rejects the
//! token. [`IdentityService`] keeps that dependency behind a trait so the coordinator stays
//! transport-agnostic; [`HttpIdentityService`] is the bundled GoTrue-compatible client.

#[cfg(feature = "reqwest")] pub mod http;
#[cfg(feature = "reqwest")] pub use http::*;

// self
use crate::{_prelude::*, auth::Secret, provider::Provider};

/// Boxed future returned by identity service calls.
pub type IdentityFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, IdentityError>> + 'a + Send>>;

/// Exchanges provider identity tokens for sessions and invalidates them again.
pub trait IdentityService: Send + Sync {
	/// Exchanges an identity token for a session.
	fn exchange<'a>(
		&'a self,
		request: ExchangeRequest<'a>,
	) -> IdentityFuture<'a, ExchangeResponse>;

	/// Invalidates the current backend session.
	fn invalidate_session(&self) -> IdentityFuture<'_, ()>;
}

/// Parameters of a single token exchange.
#[derive(Clone, Copy, Debug)]
pub struct ExchangeRequest<'a> {
	/// Provider that issued the token.
	pub provider: Provider,
	/// Compact identity token.
	pub id_token: &'a Secret,
	/// Nonce to submit; `None` omits the parameter entirely.
	pub nonce: Option<&'a Secret>,
}

/// Identity service reply. Fields stay optional so missing values can be reported precisely.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExchangeResponse {
	/// Issued session, if any.
	#[serde(default)]
	pub session: Option<ExchangedSession>,
}

/// Session fields as returned by the identity service.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExchangedSession {
	/// Access token.
	#[serde(default)]
	pub access_token: Option<Secret>,
	/// Refresh token.
	#[serde(default)]
	pub refresh_token: Option<Secret>,
}
impl ExchangedSession {
	/// Builds a complete session reply.
	pub fn new(access_token: impl Into<Secret>, refresh_token: impl Into<Secret>) -> Self {
		Self { access_token: Some(access_token.into()), refresh_token: Some(refresh_token.into()) }
	}
}
impl From<ExchangedSession> for ExchangeResponse {
	fn from(session: ExchangedSession) -> Self {
		Self { session: Some(session) }
	}
}

/// Failure reported by the identity service or its transport.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Identity service rejected the request: {message}{}", status_suffix(.status))]
pub struct IdentityError {
	/// Service-supplied message.
	pub message: String,
	/// Service error code (`bad_jwt`, `validation_failed`, ...).
	pub code: Option<String>,
	/// HTTP status, when the failure came from a response.
	pub status: Option<u16>,
}
impl IdentityError {
	/// Creates an error carrying only a message.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into(), code: None, status: None }
	}

	/// Attaches the service error code.
	pub fn with_code(mut self, code: impl Into<String>) -> Self {
		self.code = Some(code.into());

		self
	}

	/// Attaches the HTTP status.
	pub fn with_status(mut self, status: u16) -> Self {
		self.status = Some(status);

		self
	}

	/// Returns `true` when the failure concerns the submitted nonce.
	///
	/// The service reports nonce problems only as free text ("Nonces mismatch", "Passed nonce
	/// and nonce in id_token should either both exist or not."), so both the code and the
	/// message are inspected.
	pub fn is_nonce_mismatch(&self) -> bool {
		let in_code = self
			.code
			.as_deref()
			.is_some_and(|code| code.to_ascii_lowercase().contains("nonce"));

		in_code || self.message.to_ascii_lowercase().contains("nonce")
	}
}

fn status_suffix(status: &Option<u16>) -> String {
	status.map(|status| format!(" (HTTP {status})")).unwrap_or_default()
}
