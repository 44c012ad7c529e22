//! Optional observability helpers for bridge operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `native_auth_bridge.flow` with the `flow` (operation)
//!   and `stage` (call site) fields, plus debug events for dropped messages and nonce retries.
//! - Enable `metrics` to increment the `native_auth_bridge_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Bridge operations observed by the coordinator and host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Native Sign in with Apple followed by a token exchange.
	AppleSignIn,
	/// Native Google Sign-In followed by the nonce-reconciled token exchange.
	GoogleSignIn,
	/// Native sign-out plus backend session invalidation.
	SignOut,
	/// Embedded content page load, from navigation start to readiness.
	PageLoad,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::AppleSignIn => "apple_sign_in",
			FlowKind::GoogleSignIn => "google_sign_in",
			FlowKind::SignOut => "sign_out",
			FlowKind::PageLoad => "page_load",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a bridge operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Attempt rejected before starting (already in progress, host busy).
	Rejected,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
			FlowOutcome::Rejected => "rejected",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
