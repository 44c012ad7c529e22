//! Scripted adapters, a recording identity service, and a recording surface shared by the
//! integration tests.

#![allow(dead_code)]

// std
use std::{collections::VecDeque, sync::Arc, time::Duration};
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;
// self
use native_auth_bridge::{
	auth::Secret,
	config::BridgeConfig,
	coordinator::AuthCoordinator,
	host::{ContentSurface, WatchdogTicket},
	identity::{
		ExchangeRequest, ExchangeResponse, ExchangedSession, IdentityError, IdentityFuture,
		IdentityService,
	},
	provider::{
		AppleIdentity, AppleSignIn, GoogleIdentity, GoogleSignIn, GoogleSignInRequest, Provider,
		ProviderError, ProviderFuture,
	},
	url::Url,
};

pub const WEB_CLIENT_ID: &str = "1234567890-web.apps.googleusercontent.com";
pub const IOS_CLIENT_ID: &str = "1234567890-ios.apps.googleusercontent.com";

/// Builds an unsigned compact token around `payload`.
pub fn token(payload: Value) -> String {
	let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","kid":"test","typ":"JWT"}"#);
	let body = URL_SAFE_NO_PAD.encode(payload.to_string());

	format!("{header}.{body}.c2lnbmF0dXJl")
}

/// A complete session reply.
pub fn session_reply(access: &str, refresh: &str) -> Result<ExchangeResponse, IdentityError> {
	Ok(ExchangedSession::new(access, refresh).into())
}

/// Configuration used across host tests.
pub fn config() -> BridgeConfig {
	BridgeConfig::builder()
		.web_origin(Url::parse("https://dance.example.com").expect("Origin should parse."))
		.app_scheme("myapp")
		.google_web_client_id(WEB_CLIENT_ID)
		.google_ios_client_id(IOS_CLIENT_ID)
		.build()
		.expect("Config should build.")
}

/// Async gate used to hold an adapter call open until the test releases it.
#[derive(Clone, Default)]
pub struct Gate {
	entered: Arc<Notify>,
	release: Arc<Notify>,
}
impl Gate {
	pub async fn wait_entered(&self) {
		self.entered.notified().await;
	}

	pub fn open(&self) {
		self.release.notify_one();
	}

	async fn pass(&self) {
		self.entered.notify_one();
		self.release.notified().await;
	}
}

/// Apple adapter replaying queued results.
#[derive(Default)]
pub struct ScriptedApple {
	replies: Mutex<VecDeque<Result<AppleIdentity, ProviderError>>>,
	gate: Option<Gate>,
	calls: Mutex<usize>,
}
impl ScriptedApple {
	pub fn replying(reply: Result<AppleIdentity, ProviderError>) -> Self {
		Self { replies: Mutex::new(VecDeque::from([reply])), ..Default::default() }
	}

	pub fn gated(mut self, gate: Gate) -> Self {
		self.gate = Some(gate);

		self
	}

	pub fn calls(&self) -> usize {
		*self.calls.lock()
	}
}
impl AppleSignIn for ScriptedApple {
	fn sign_in(&self) -> ProviderFuture<'_, AppleIdentity> {
		*self.calls.lock() += 1;

		let reply = self.replies.lock().pop_front().unwrap_or_else(|| {
			Err(ProviderError::new(Provider::Apple, "No scripted reply.").with_code("SCRIPT_EMPTY"))
		});
		let gate = self.gate.clone();

		Box::pin(async move {
			if let Some(gate) = gate {
				gate.pass().await;
			}

			reply
		})
	}
}

/// Google adapter replaying queued results and recording requests.
#[derive(Default)]
pub struct ScriptedGoogle {
	replies: Mutex<VecDeque<Result<GoogleIdentity, ProviderError>>>,
	sign_out_error: Option<ProviderError>,
	gate: Option<Gate>,
	requests: Mutex<Vec<GoogleSignInRequest>>,
	sign_outs: Mutex<usize>,
}
impl ScriptedGoogle {
	pub fn replying(reply: Result<GoogleIdentity, ProviderError>) -> Self {
		Self { replies: Mutex::new(VecDeque::from([reply])), ..Default::default() }
	}

	pub fn then(self, reply: Result<GoogleIdentity, ProviderError>) -> Self {
		self.replies.lock().push_back(reply);

		self
	}

	pub fn gated(mut self, gate: Gate) -> Self {
		self.gate = Some(gate);

		self
	}

	pub fn failing_sign_out(mut self, error: ProviderError) -> Self {
		self.sign_out_error = Some(error);

		self
	}

	pub fn requests(&self) -> Vec<GoogleSignInRequest> {
		self.requests.lock().clone()
	}

	pub fn sign_outs(&self) -> usize {
		*self.sign_outs.lock()
	}
}
impl GoogleSignIn for ScriptedGoogle {
	fn sign_in<'a>(
		&'a self,
		request: &'a GoogleSignInRequest,
	) -> ProviderFuture<'a, GoogleIdentity> {
		self.requests.lock().push(request.clone());

		let reply = self.replies.lock().pop_front().unwrap_or_else(|| {
			Err(ProviderError::new(Provider::Google, "No scripted reply.")
				.with_code("SCRIPT_EMPTY"))
		});
		let gate = self.gate.clone();

		Box::pin(async move {
			if let Some(gate) = gate {
				gate.pass().await;
			}

			reply
		})
	}

	fn sign_out(&self) -> ProviderFuture<'_, ()> {
		*self.sign_outs.lock() += 1;

		let reply = match &self.sign_out_error {
			Some(error) => Err(error.clone()),
			None => Ok(()),
		};

		Box::pin(async move { reply })
	}
}

/// One recorded exchange call, with secrets exposed for assertions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedExchange {
	pub provider: Provider,
	pub id_token: String,
	pub nonce: Option<String>,
}

/// Identity service replaying queued replies and recording every call.
#[derive(Default)]
pub struct RecordingIdentity {
	replies: Mutex<VecDeque<Result<ExchangeResponse, IdentityError>>>,
	invalidate_error: Option<IdentityError>,
	calls: Mutex<Vec<RecordedExchange>>,
	invalidations: Mutex<usize>,
}
impl RecordingIdentity {
	pub fn replying(reply: Result<ExchangeResponse, IdentityError>) -> Self {
		Self { replies: Mutex::new(VecDeque::from([reply])), ..Default::default() }
	}

	pub fn then(self, reply: Result<ExchangeResponse, IdentityError>) -> Self {
		self.replies.lock().push_back(reply);

		self
	}

	pub fn failing_invalidation(mut self, error: IdentityError) -> Self {
		self.invalidate_error = Some(error);

		self
	}

	pub fn calls(&self) -> Vec<RecordedExchange> {
		self.calls.lock().clone()
	}

	pub fn invalidations(&self) -> usize {
		*self.invalidations.lock()
	}
}
impl IdentityService for RecordingIdentity {
	fn exchange<'a>(
		&'a self,
		request: ExchangeRequest<'a>,
	) -> IdentityFuture<'a, ExchangeResponse> {
		self.calls.lock().push(RecordedExchange {
			provider: request.provider,
			id_token: request.id_token.expose().to_owned(),
			nonce: request.nonce.map(Secret::expose).map(str::to_owned),
		});

		let reply = self
			.replies
			.lock()
			.pop_front()
			.unwrap_or_else(|| Err(IdentityError::new("No scripted reply.")));

		Box::pin(async move { reply })
	}

	fn invalidate_session(&self) -> IdentityFuture<'_, ()> {
		*self.invalidations.lock() += 1;

		let reply = match &self.invalidate_error {
			Some(error) => Err(error.clone()),
			None => Ok(()),
		};

		Box::pin(async move { reply })
	}
}

/// Surface recording every callback.
#[derive(Default)]
pub struct RecordingSurface {
	scripts: Mutex<Vec<String>>,
	opened: Mutex<Vec<Url>>,
	scheduled: Mutex<Vec<(WatchdogTicket, Duration)>>,
	reloads: Mutex<usize>,
}
impl RecordingSurface {
	pub fn scripts(&self) -> Vec<String> {
		self.scripts.lock().clone()
	}

	pub fn opened(&self) -> Vec<Url> {
		self.opened.lock().clone()
	}

	pub fn scheduled(&self) -> Vec<(WatchdogTicket, Duration)> {
		self.scheduled.lock().clone()
	}

	pub fn last_ticket(&self) -> WatchdogTicket {
		self.scheduled.lock().last().expect("A watchdog should have been scheduled.").0
	}

	pub fn reloads(&self) -> usize {
		*self.reloads.lock()
	}
}
impl ContentSurface for RecordingSurface {
	fn inject_script(&self, script: &str) {
		self.scripts.lock().push(script.to_owned());
	}

	fn open_external(&self, url: &Url) {
		self.opened.lock().push(url.clone());
	}

	fn schedule_watchdog(&self, ticket: WatchdogTicket, after: Duration) {
		self.scheduled.lock().push((ticket, after));
	}

	fn reload(&self) {
		*self.reloads.lock() += 1;
	}
}

/// Coordinator wired to the given fakes.
pub fn coordinator(
	apple: Arc<ScriptedApple>,
	google: Arc<ScriptedGoogle>,
	identity: Arc<RecordingIdentity>,
) -> Arc<AuthCoordinator> {
	Arc::new(AuthCoordinator::new(apple, google, identity))
}
