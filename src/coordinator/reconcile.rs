//! Nonce reconciliation for Google identity tokens.
//!
//! Google puts whatever nonce the SDK sent into the token's `nonce` claim. Depending on the SDK
//! version that is either the raw value or its SHA-256 digest, while the identity service compares
//! the claim against what it receives. The exchange therefore runs in two explicit steps:
//! [`plan`] inspects the decoded claims before any network call, and [`exchange`] submits the raw
//! nonce first and falls back to the claim value exactly once.

// self
use crate::{
	_prelude::*,
	auth::{DecodedClaims, Secret, mask},
	identity::{ExchangeRequest, ExchangeResponse, IdentityError, IdentityService},
	obs::{self, FlowKind},
	provider::Provider,
};

/// Which nonce, if any, the exchange submits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum NoncePlan {
	/// The token carries no nonce claim; the parameter is omitted.
	Omit,
	/// Submit the raw nonce; the claim value is the single fallback.
	Raw {
		/// Adapter-generated raw nonce.
		raw: Secret,
		/// Nonce claim found in the token.
		claim: Secret,
	},
}

/// Step one: audience preflight and nonce selection. Never touches the network.
pub(crate) fn plan(
	raw_nonce: Option<&Secret>,
	claims: Option<&DecodedClaims>,
	expected_audience: &str,
) -> Result<NoncePlan> {
	let Some(claims) = claims else {
		return Ok(NoncePlan::Omit);
	};

	check_audience(claims, expected_audience)?;

	let Some(claim) = claims.nonce() else {
		return Ok(NoncePlan::Omit);
	};
	let Some(raw) = raw_nonce else {
		return Err(Error::NonceMissingRaw);
	};

	Ok(NoncePlan::Raw { raw: raw.clone(), claim: Secret::new(claim) })
}

/// Step two: exchange with the planned nonce, retrying once with the claim on a nonce mismatch.
pub(crate) async fn exchange(
	identity: &dyn IdentityService,
	id_token: &Secret,
	plan: &NoncePlan,
) -> Result<ExchangeResponse> {
	let (raw, claim) = match plan {
		NoncePlan::Omit => {
			let request = ExchangeRequest { provider: Provider::Google, id_token, nonce: None };

			return identity.exchange(request).await.map_err(|e| fatal(e, false));
		},
		NoncePlan::Raw { raw, claim } => (raw, claim),
	};
	let first = ExchangeRequest { provider: Provider::Google, id_token, nonce: Some(raw) };
	let err = match identity.exchange(first).await {
		Ok(response) => return Ok(response),
		Err(e) => e,
	};

	if !err.is_nonce_mismatch() || claim.expose() == raw.expose() {
		return Err(fatal(err, false));
	}

	obs::debug_event(
		FlowKind::GoogleSignIn,
		&format!(
			"retrying exchange with token nonce raw={} claim={}",
			mask(raw.expose()),
			mask(claim.expose())
		),
	);

	let retry = ExchangeRequest { provider: Provider::Google, id_token, nonce: Some(claim) };

	identity.exchange(retry).await.map_err(|source| Error::NonceMismatch { source, retried: true })
}

fn check_audience(claims: &DecodedClaims, expected: &str) -> Result<()> {
	let expected = expected.trim();
	let audiences = claims.audiences();

	if expected.is_empty() || audiences.is_empty() || audiences.contains(&expected) {
		return Ok(());
	}

	Err(Error::InvalidAudience { expected: mask(expected), actual: mask(&audiences.join(",")) })
}

fn fatal(err: IdentityError, retried: bool) -> Error {
	if err.is_nonce_mismatch() {
		Error::NonceMismatch { source: err, retried }
	} else {
		Error::Identity(err)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn claims(payload: serde_json::Value) -> DecodedClaims {
		let serde_json::Value::Object(map) = payload else {
			panic!("Payload must be an object.");
		};

		DecodedClaims::from_payload(map)
	}

	#[test]
	fn tokens_without_nonce_claim_omit_the_nonce() {
		let raw = Secret::new("raw-nonce");
		let claims = claims(json!({ "aud": "web-client" }));

		assert_eq!(
			plan(Some(&raw), Some(&claims), "web-client").expect("Plan should succeed."),
			NoncePlan::Omit
		);
		assert_eq!(
			plan(Some(&raw), None, "web-client").expect("Plan should succeed."),
			NoncePlan::Omit
		);
	}

	#[test]
	fn nonce_claim_without_raw_nonce_is_fatal() {
		let claims = claims(json!({ "aud": "web-client", "nonce": "abc" }));

		assert!(matches!(plan(None, Some(&claims), "web-client"), Err(Error::NonceMissingRaw)));
	}

	#[test]
	fn audience_preflight_runs_before_nonce_selection() {
		let claims = claims(json!({ "aud": ["other-client"], "nonce": "abc" }));
		let err = plan(None, Some(&claims), "web-client-000000000000")
			.expect_err("Audience should mismatch.");

		let Error::InvalidAudience { expected, actual } = err else {
			panic!("Unexpected error: {err:?}.");
		};

		assert_eq!(expected, "web-cl…(23)");
		assert_eq!(actual, "…(12)");
	}

	#[test]
	fn empty_expected_audience_skips_the_preflight() {
		let raw = Secret::new("raw");
		let claims = claims(json!({ "aud": "anything", "nonce": "hashed" }));

		assert_eq!(
			plan(Some(&raw), Some(&claims), " ").expect("Plan should succeed."),
			NoncePlan::Raw { raw: Secret::new("raw"), claim: Secret::new("hashed") }
		);
	}

	#[test]
	fn non_nonce_failures_stay_identity_errors() {
		assert!(matches!(fatal(IdentityError::new("Invalid token"), false), Error::Identity(_)));
		assert!(matches!(
			fatal(IdentityError::new("Nonces mismatch"), false),
			Error::NonceMismatch { retried: false, .. }
		));
	}
}
