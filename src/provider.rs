//! Native sign-in adapter contracts (Apple, Google) and their shared error shape.
//!
//! Adapters wrap the platform SDKs. They stay free of any bridge logic: each call returns the raw
//! provider result and the coordinator decides whether it is usable. Errors keep the provider's
//! own `code` and `status` so callers can tell a user cancellation from a misconfiguration.

pub mod apple;
pub mod google;

pub use apple::*;
pub use google::*;

// self
use crate::_prelude::*;

/// Boxed future returned by adapter calls.
pub type ProviderFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, ProviderError>> + 'a + Send>>;

/// Identity providers the bridge can delegate to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
	/// Sign in with Apple.
	Apple,
	/// Google Sign-In.
	Google,
}
impl Provider {
	/// Returns the identifier the identity service expects (`apple`, `google`).
	pub const fn as_str(self) -> &'static str {
		match self {
			Provider::Apple => "apple",
			Provider::Google => "google",
		}
	}
}
impl Display for Provider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Failure reported by a native SDK, preserved as-is.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{provider} sign-in failed: {message}{}", code_suffix(.code.as_deref(), .status))]
pub struct ProviderError {
	/// Provider that produced the failure.
	pub provider: Provider,
	/// SDK-specific error code (`SIGN_IN_CANCELLED`, `1001`, ...).
	pub code: Option<String>,
	/// Numeric status, when the SDK exposes one.
	pub status: Option<i64>,
	/// SDK-supplied message.
	pub message: String,
}
impl ProviderError {
	const CANCELLED_CODES: [&'static str; 6] =
		["SIGN_IN_CANCELLED", "12501", "ERR_REQUEST_CANCELED", "ERR_CANCELED", "1001", "-5"];

	/// Creates an error carrying only a message.
	pub fn new(provider: Provider, message: impl Into<String>) -> Self {
		Self { provider, code: None, status: None, message: message.into() }
	}

	/// Attaches the SDK error code.
	pub fn with_code(mut self, code: impl Into<String>) -> Self {
		self.code = Some(code.into());

		self
	}

	/// Attaches the SDK numeric status.
	pub fn with_status(mut self, status: i64) -> Self {
		self.status = Some(status);

		self
	}

	/// Returns `true` when the user dismissed the native sign-in sheet.
	pub fn is_cancelled(&self) -> bool {
		let code_matches = self.code.as_deref().is_some_and(|code| {
			Self::CANCELLED_CODES.iter().any(|known| code.eq_ignore_ascii_case(known))
		});
		let status_matches = matches!(self.status, Some(12501 | 1001 | -5));

		code_matches || status_matches
	}
}

fn code_suffix(code: Option<&str>, status: &Option<i64>) -> String {
	match (code, status) {
		(Some(code), Some(status)) => format!(" (code {code}, status {status})"),
		(Some(code), None) => format!(" (code {code})"),
		(None, Some(status)) => format!(" (status {status})"),
		(None, None) => String::new(),
	}
}
