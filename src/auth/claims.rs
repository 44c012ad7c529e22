//! Advisory decoding of compact identity tokens.
//!
//! The decoder reads the payload segment of a `header.payload.signature` token without checking
//! the signature. Verification belongs to the backend identity service; the claims produced here
//! only drive preflight checks (audience, nonce presence) and masked diagnostics, so they must
//! never be treated as a trust boundary.

// crates.io
use base64::{
	Engine as _,
	engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use serde_json::{Map, Value};
use time::OffsetDateTime;
// self
use crate::_prelude::*;

/// Claims read from an identity token's payload segment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedClaims {
	payload: Map<String, Value>,
}
impl DecodedClaims {
	/// Wraps an already-parsed payload object.
	pub fn from_payload(payload: Map<String, Value>) -> Self {
		Self { payload }
	}

	/// Raw payload object, including claims without a dedicated accessor.
	pub fn payload(&self) -> &Map<String, Value> {
		&self.payload
	}

	/// Audience values; the `aud` claim may be a single string or an array of strings.
	pub fn audiences(&self) -> Vec<&str> {
		match self.payload.get("aud") {
			Some(Value::String(aud)) => vec![aud.as_str()],
			Some(Value::Array(values)) => values.iter().filter_map(Value::as_str).collect(),
			_ => Vec::new(),
		}
	}

	/// First audience value, if any.
	pub fn aud(&self) -> Option<&str> {
		self.audiences().into_iter().next()
	}

	/// Authorized party (`azp`).
	pub fn azp(&self) -> Option<&str> {
		self.str_claim("azp")
	}

	/// Nonce echoed by the provider. Blank values count as absent.
	pub fn nonce(&self) -> Option<&str> {
		self.str_claim("nonce").filter(|value| !value.trim().is_empty())
	}

	/// Issuer (`iss`).
	pub fn iss(&self) -> Option<&str> {
		self.str_claim("iss")
	}

	/// Subject (`sub`).
	pub fn sub(&self) -> Option<&str> {
		self.str_claim("sub")
	}

	/// Email address, when the provider shares one.
	pub fn email(&self) -> Option<&str> {
		self.str_claim("email")
	}

	/// Expiry (`exp`).
	pub fn exp(&self) -> Option<OffsetDateTime> {
		self.time_claim("exp")
	}

	/// Issue time (`iat`).
	pub fn iat(&self) -> Option<OffsetDateTime> {
		self.time_claim("iat")
	}

	/// Re-encodes the payload as an unpadded base64url segment.
	pub fn to_segment(&self) -> String {
		URL_SAFE_NO_PAD.encode(Value::Object(self.payload.clone()).to_string())
	}

	fn str_claim(&self, name: &str) -> Option<&str> {
		self.payload.get(name).and_then(Value::as_str)
	}

	fn time_claim(&self, name: &str) -> Option<OffsetDateTime> {
		let seconds = self.payload.get(name).and_then(Value::as_i64)?;

		OffsetDateTime::from_unix_timestamp(seconds).ok()
	}
}

/// Decodes the claims of a compact token, returning `None` for any malformed input.
pub fn decode_claims(token: &str) -> Option<DecodedClaims> {
	decode_payload(token).map(DecodedClaims::from_payload)
}

/// Decodes the payload segment of a compact token into a JSON object.
pub fn decode_payload(token: &str) -> Option<Map<String, Value>> {
	let mut segments = token.trim().split('.');
	let _header = segments.next()?;
	let payload = segments.next()?;

	if payload.is_empty() {
		return None;
	}

	let bytes = STANDARD.decode(to_standard_alphabet(payload)).ok()?;

	match serde_json::from_slice::<Value>(&bytes).ok()? {
		Value::Object(map) => Some(map),
		_ => None,
	}
}

fn to_standard_alphabet(segment: &str) -> String {
	let mut converted: String = segment
		.chars()
		.filter(|ch| *ch != '=')
		.map(|ch| match ch {
			'-' => '+',
			'_' => '/',
			other => other,
		})
		.collect();

	while converted.len() % 4 != 0 {
		converted.push('=');
	}

	converted
}
