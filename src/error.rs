//! Bridge-level error types shared by the coordinator, host, and configuration layer.

// self
use crate::{
	_prelude::*,
	identity::IdentityError,
	provider::{Provider, ProviderError},
};

/// Bridge-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical bridge error exposed by public APIs.
///
/// Messages never embed raw tokens or nonces; only masked previews appear in
/// [`Diagnostics`].
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; retrying cannot fix it.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Native SDK failure, preserved with its code and status.
	#[error(transparent)]
	Provider(#[from] ProviderError),
	/// Identity service or transport failure.
	#[error(transparent)]
	Identity(#[from] IdentityError),

	/// Another sign-in attempt is still running.
	#[error("Another sign-in is already in progress; the {provider} attempt was rejected.")]
	AlreadyInProgress {
		/// Provider of the rejected attempt.
		provider: Provider,
	},
	/// The native SDK returned an incomplete result.
	#[error("{provider} sign-in returned an incomplete response: {reason}.")]
	InvalidProviderResponse {
		/// Provider that produced the result.
		provider: Provider,
		/// Which field was missing.
		reason: &'static str,
	},
	/// The identity token carries a nonce but the adapter produced no raw nonce.
	#[error("Identity token carries a nonce but no raw nonce was generated for the request.")]
	NonceMissingRaw,
	/// The token was minted for a different client than the configured web client.
	#[error(
		"Identity token audience does not match the configured web client id \
		 (expected {expected}, got {actual})."
	)]
	InvalidAudience {
		/// Masked preview of the expected audience.
		expected: String,
		/// Masked preview of the token audience.
		actual: String,
	},
	/// The identity service rejected the nonce.
	#[error("Identity service rejected the nonce{}: {source}", retry_suffix(.retried))]
	NonceMismatch {
		/// Last identity service failure.
		#[source]
		source: IdentityError,
		/// Whether the single fallback attempt was made.
		retried: bool,
	},
	/// The identity service answered without a usable session.
	#[error("Session exchange failed: {reason}.")]
	SessionExchangeFailed {
		/// Which part of the session was missing.
		reason: &'static str,
	},
	/// Both native sign-out and backend session invalidation failed.
	#[error("Sign-out failed: {native}; {backend}")]
	SignOutFailed {
		/// Native SDK failure.
		native: ProviderError,
		/// Identity service failure.
		backend: IdentityError,
	},
	/// A fatal error annotated with correlation diagnostics.
	#[error("{source} {diagnostics}")]
	Annotated {
		/// Underlying failure.
		#[source]
		source: Box<Error>,
		/// Masked correlation context.
		diagnostics: Diagnostics,
	},
}
impl Error {
	/// Attaches diagnostics, replacing any previously attached set.
	pub fn annotate(self, diagnostics: Diagnostics) -> Self {
		match self {
			Error::Annotated { source, .. } => Error::Annotated { source, diagnostics },
			other => Error::Annotated { source: Box::new(other), diagnostics },
		}
	}

	/// Returns the underlying error without diagnostics.
	pub fn root(&self) -> &Error {
		match self {
			Error::Annotated { source, .. } => source.root(),
			other => other,
		}
	}

	/// Returns the diagnostics attached to this error, if any.
	pub fn diagnostics(&self) -> Option<&Diagnostics> {
		match self {
			Error::Annotated { diagnostics, .. } => Some(diagnostics),
			_ => None,
		}
	}

	/// Returns `true` for failures a user may reasonably retry.
	///
	/// Configuration-class failures (missing client ids, audience mismatch) and concurrent
	/// attempts are excluded.
	pub fn is_retryable(&self) -> bool {
		!matches!(
			self.root(),
			Error::Config(_) | Error::InvalidAudience { .. } | Error::AlreadyInProgress { .. }
		)
	}

	/// Returns `true` when the user dismissed the native sign-in sheet.
	pub fn is_cancelled(&self) -> bool {
		matches!(self.root(), Error::Provider(e) if e.is_cancelled())
	}
}

/// Configuration and validation failures raised by the bridge.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ConfigError {
	/// A required OAuth client identifier is missing.
	#[error("The Google {which} client id is not configured.")]
	MissingClientId {
		/// Which client id (`web`, `ios`).
		which: &'static str,
	},
	/// Bridge configuration failed validation.
	#[error(transparent)]
	Bridge(#[from] crate::config::BridgeConfigError),
}

/// Masked correlation context attached to fatal sign-in errors.
///
/// Rendered as a bracketed suffix such as
/// `[req=abc provider=google raw_nonce=Zx81Qa…(32) token_nonce=9f2c11…(64) aud=1234-a…(72)]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
	/// Caller-supplied correlation identifier.
	pub request_id: Option<String>,
	/// Provider of the failed attempt.
	pub provider: Option<Provider>,
	/// Masked raw nonce preview.
	pub raw_nonce: Option<String>,
	/// Masked nonce-claim preview.
	pub token_nonce: Option<String>,
	/// Masked token audience preview.
	pub audience: Option<String>,
	/// Masked expected audience preview.
	pub expected_audience: Option<String>,
	/// Whether the nonce fallback attempt was made.
	pub nonce_retried: bool,
}
impl Display for Diagnostics {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut parts = Vec::new();

		if let Some(request_id) = &self.request_id {
			parts.push(format!("req={request_id}"));
		}
		if let Some(provider) = self.provider {
			parts.push(format!("provider={provider}"));
		}
		if let Some(raw) = &self.raw_nonce {
			parts.push(format!("raw_nonce={raw}"));
		}
		if let Some(token) = &self.token_nonce {
			parts.push(format!("token_nonce={token}"));
		}
		if let Some(aud) = &self.audience {
			parts.push(format!("aud={aud}"));
		}
		if let Some(expected) = &self.expected_audience {
			parts.push(format!("expected_aud={expected}"));
		}
		if self.nonce_retried {
			parts.push("nonce_retry=1".into());
		}

		write!(f, "[{}]", parts.join(" "))
	}
}

fn retry_suffix(retried: &bool) -> &'static str {
	if *retried { " after retrying with the token nonce" } else { "" }
}
