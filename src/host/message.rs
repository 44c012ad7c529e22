//! Messages posted by the embedded content.

// self
use crate::_prelude::*;

/// Inbound message, tagged on `type`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeMessage {
	/// The content finished bootstrapping.
	#[serde(rename = "READY")]
	Ready,
	/// Start Sign in with Apple.
	#[serde(rename = "NATIVE_AUTH_APPLE")]
	NativeAuthApple,
	/// Start Google Sign-In.
	#[serde(rename = "NATIVE_AUTH_GOOGLE")]
	NativeAuthGoogle {
		/// Correlation id echoed in diagnostics.
		#[serde(default, rename = "requestId")]
		request_id: Option<String>,
	},
	/// Sign out natively and invalidate the backend session.
	#[serde(rename = "NATIVE_SIGN_OUT")]
	NativeSignOut,
}
impl BridgeMessage {
	/// Parses and shape-checks one raw message.
	pub fn parse(raw: &str) -> Result<Self, MessageError> {
		let mut deserializer = serde_json::Deserializer::from_str(raw);

		serde_path_to_error::deserialize(&mut deserializer).map_err(|e| MessageError::Malformed {
			path: e.path().to_string(),
			message: e.inner().to_string(),
		})
	}

	/// Returns `true` for messages that start an auth operation.
	pub fn is_auth(&self) -> bool {
		!matches!(self, BridgeMessage::Ready)
	}
}

/// Rejected inbound message.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum MessageError {
	/// The payload is not JSON or does not match any known message shape.
	#[error("Bridge message is malformed at `{path}`: {message}.")]
	Malformed {
		/// Path of the offending field.
		path: String,
		/// Parser message.
		message: String,
	},
}
