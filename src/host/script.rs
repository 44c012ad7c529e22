//! Scripts injected into the embedded content.
//!
//! Every dynamic value is JSON-encoded before interpolation. Hook names come from a validated
//! [`BridgeConfig`](crate::config::BridgeConfig) and are plain identifier paths.

// crates.io
use serde_json::{Value, json};
use url::Position;
// self
use crate::{_prelude::*, auth::SessionTokens};

/// Installs `session` through the content's global handler, if the content defines one.
pub fn install_session(handler: &str, session: &SessionTokens) -> String {
	let payload = json!({
		"access_token": session.access_token.expose(),
		"refresh_token": session.refresh_token.expose(),
	});

	format!("if (typeof window.{handler} === 'function') {{ window.{handler}({payload}); }} true;")
}

/// Dispatches the auth error event with `{ detail: { message } }`.
pub fn auth_error(event: &str, message: &str) -> String {
	let detail = json!({ "message": message });

	format!(
		"window.dispatchEvent(new CustomEvent({}, {{ detail: {detail} }})); true;",
		js_string(event)
	)
}

/// Moves the content to `url`.
///
/// When the page already sits on the target origin the path is pushed onto the history and a
/// `popstate` is dispatched, leaving the document and its state alive for the client-side router.
/// Any other origin falls back to a full load.
pub fn navigate(url: &Url) -> String {
	let origin = js_string(&url.origin().ascii_serialization());
	let path = js_string(&url[Position::BeforePath..]);
	let target = js_string(url.as_str());

	format!(
		"if (window.location.origin === {origin} && window.history && window.history.pushState) {{ \
		 window.history.pushState(null, \"\", {path}); \
		 window.dispatchEvent(new PopStateEvent(\"popstate\", {{ state: null }})); \
		 }} else {{ window.location.href = {target}; }} true;"
	)
}

fn js_string(value: &str) -> String {
	Value::String(value.to_owned()).to_string()
}
