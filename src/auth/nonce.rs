//! Nonce generation for native sign-in requests and masked previews for diagnostics.

// crates.io
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::Secret};

const RAW_NONCE_LEN: usize = 32;
const PREVIEW_PREFIX: usize = 6;
const PREVIEW_MIN_LEN: usize = 13;

/// Raw nonce plus the SHA-256 digest handed to the native SDK.
///
/// Apple and Google both echo the *hashed* value in the identity token's `nonce` claim while the
/// identity service expects the *raw* value, which is why the coordinator carries both.
#[derive(Clone)]
pub struct NoncePair {
	/// Unhashed nonce forwarded to the identity service.
	pub raw: Secret,
	/// Lowercase hex SHA-256 digest of [`NoncePair::raw`].
	pub sha256: String,
}
impl NoncePair {
	/// Generates a fresh random nonce pair.
	pub fn generate() -> Self {
		Self::from_raw(random_string(RAW_NONCE_LEN))
	}

	/// Builds the pair for a known raw nonce.
	pub fn from_raw(raw: impl Into<String>) -> Self {
		let raw = raw.into();
		let sha256 = sha256_hex(&raw);

		Self { raw: Secret::new(raw), sha256 }
	}
}
impl Debug for NoncePair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("NoncePair")
			.field("raw", &self.raw)
			.field("sha256", &mask(&self.sha256))
			.finish()
	}
}

/// Lowercase hex SHA-256 digest of `value`.
pub fn sha256_hex(value: &str) -> String {
	let digest = Sha256::digest(value.as_bytes());

	digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Masks a sensitive value down to a short prefix and its length.
///
/// Values shorter than 13 characters never reveal any character.
pub fn mask(value: &str) -> String {
	let len = value.chars().count();

	if len == 0 {
		return "<empty>".into();
	}
	if len < PREVIEW_MIN_LEN {
		return format!("…({len})");
	}

	let prefix: String = value.chars().take(PREVIEW_PREFIX).collect();

	format!("{prefix}…({len})")
}

/// Masks an optional value, rendering `-` when it is absent.
pub fn mask_opt(value: Option<&str>) -> String {
	value.map(mask).unwrap_or_else(|| "-".into())
}

pub(crate) fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
