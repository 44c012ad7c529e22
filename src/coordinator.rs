//! Auth coordinator: native sign-in, token exchange, and the observable auth state.
//!
//! [`AuthCoordinator`] owns the single [`AuthState`] cell. Every sign-in goes through one shared
//! latch so at most one attempt (Apple or Google) is in flight; a concurrent call is rejected with
//! [`Error::AlreadyInProgress`] without touching the state or the running attempt. The latch guard
//! is dropped on every exit path, including cancellation of the returned future, and an abandoned
//! attempt leaves [`AuthStatus::Error`] behind rather than a stuck [`AuthStatus::Loading`].

pub mod publisher;

mod reconcile;

pub use publisher::*;

// self
use crate::{
	_prelude::*,
	auth::{self, Secret, SessionTokens, decode_claims, mask},
	error::{ConfigError, Diagnostics},
	identity::{ExchangeRequest, ExchangeResponse, IdentityService},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{AppleSignIn, GoogleSignIn, GoogleSignInRequest, Provider},
};

const INTERRUPTED_MESSAGE: &str = "Sign-in was interrupted before it finished.";

/// Coarse authentication status mirrored to the embedded content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
	/// A sign-in attempt is running.
	Loading,
	/// No session is installed.
	LoggedOut,
	/// The last sign-in produced a session.
	LoggedIn,
	/// The last operation failed; see [`AuthState::error`].
	Error,
}
impl AuthStatus {
	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthStatus::Loading => "loading",
			AuthStatus::LoggedOut => "logged_out",
			AuthStatus::LoggedIn => "logged_in",
			AuthStatus::Error => "error",
		}
	}
}
impl Display for AuthStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Observable authentication state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
	/// Current status.
	pub status: AuthStatus,
	/// Failure message when `status` is [`AuthStatus::Error`].
	pub error: Option<String>,
}
impl AuthState {
	/// Signed-out state; also the initial state.
	pub fn logged_out() -> Self {
		Self { status: AuthStatus::LoggedOut, error: None }
	}

	/// Sign-in in progress.
	pub fn loading() -> Self {
		Self { status: AuthStatus::Loading, error: None }
	}

	/// Signed in.
	pub fn logged_in() -> Self {
		Self { status: AuthStatus::LoggedIn, error: None }
	}

	/// Failed with the given message.
	pub fn failed(message: impl Into<String>) -> Self {
		Self { status: AuthStatus::Error, error: Some(message.into()) }
	}
}
impl Default for AuthState {
	fn default() -> Self {
		Self::logged_out()
	}
}

/// Drives native sign-in and token exchange, publishing every state transition.
pub struct AuthCoordinator {
	apple: Arc<dyn AppleSignIn>,
	google: Arc<dyn GoogleSignIn>,
	identity: Arc<dyn IdentityService>,
	publisher: StatePublisher,
	latch: AsyncMutex<()>,
}
impl AuthCoordinator {
	/// Creates a coordinator in the [`AuthStatus::LoggedOut`] state.
	pub fn new(
		apple: Arc<dyn AppleSignIn>,
		google: Arc<dyn GoogleSignIn>,
		identity: Arc<dyn IdentityService>,
	) -> Self {
		Self {
			apple,
			google,
			identity,
			publisher: StatePublisher::default(),
			latch: AsyncMutex::new(()),
		}
	}

	/// Snapshot of the current state.
	pub fn state(&self) -> AuthState {
		self.publisher.state()
	}

	/// Registers a listener; the current state is replayed to it immediately.
	pub fn subscribe<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&AuthState) + Send + Sync + 'static,
	{
		self.publisher.subscribe(listener)
	}

	/// Runs Sign in with Apple and exchanges the identity token for a session.
	pub async fn sign_in_with_apple(&self) -> Result<SessionTokens> {
		const KIND: FlowKind = FlowKind::AppleSignIn;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let Some(_attempt) = self.latch.try_lock() else {
			return Err(self.reject(KIND, Provider::Apple));
		};

		let pending = PendingAttempt::start(&self.publisher, KIND);
		let span = FlowSpan::new(KIND, "sign_in_with_apple");
		let result = span.instrument(self.apple_flow()).await;

		pending.settle(result)
	}

	/// Runs Google Sign-In and exchanges the identity token with nonce reconciliation.
	///
	/// Fatal errors carry [`Diagnostics`] with the request id and masked nonce and audience
	/// previews.
	pub async fn sign_in_with_google(&self, request: GoogleSignInRequest) -> Result<SessionTokens> {
		const KIND: FlowKind = FlowKind::GoogleSignIn;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let Some(_attempt) = self.latch.try_lock() else {
			return Err(self.reject(KIND, Provider::Google));
		};

		let pending = PendingAttempt::start(&self.publisher, KIND);
		let span = FlowSpan::new(KIND, "sign_in_with_google");
		let mut diagnostics = Diagnostics {
			request_id: Some(request.request_id.clone()),
			provider: Some(Provider::Google),
			expected_audience: Some(mask(&request.web_client_id)),
			..Default::default()
		};
		let result = span.instrument(self.google_flow(&request, &mut diagnostics)).await;
		let result = result.map_err(|e| e.annotate(diagnostics));

		pending.settle(result)
	}

	/// Signs out natively, then invalidates the backend session.
	///
	/// Both steps are best-effort. The state becomes [`AuthStatus::LoggedOut`] unless both fail,
	/// in which case [`Error::SignOutFailed`] is returned and published.
	pub async fn sign_out(&self) -> Result<()> {
		const KIND: FlowKind = FlowKind::SignOut;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let span = FlowSpan::new(KIND, "sign_out");
		let (native, backend) = span
			.instrument(async {
				let native = self.google.sign_out().await;
				let backend = self.identity.invalidate_session().await;

				(native, backend)
			})
			.await;

		match (native, backend) {
			(Err(native), Err(backend)) => {
				let err = Error::SignOutFailed { native, backend };

				self.publisher.publish(AuthState::failed(err.to_string()));
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				Err(err)
			},
			(native, backend) => {
				if let Err(e) = native {
					obs::debug_event(KIND, &format!("native sign-out failed: {e}"));
				}
				if let Err(e) = backend {
					obs::debug_event(KIND, &format!("session invalidation failed: {e}"));
				}

				self.publisher.publish(AuthState::logged_out());
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				Ok(())
			},
		}
	}

	async fn apple_flow(&self) -> Result<SessionTokens> {
		let identity = self.apple.sign_in().await?;
		let id_token = auth::non_blank(identity.identity_token.as_ref()).ok_or(
			Error::InvalidProviderResponse {
				provider: Provider::Apple,
				reason: "missing identity token",
			},
		)?;
		let nonce = auth::non_blank(identity.nonce.as_ref()).ok_or(
			Error::InvalidProviderResponse { provider: Provider::Apple, reason: "missing nonce" },
		)?;
		let request = ExchangeRequest { provider: Provider::Apple, id_token, nonce: Some(nonce) };
		let response = self.identity.exchange(request).await?;

		session_from(response)
	}

	async fn google_flow(
		&self,
		request: &GoogleSignInRequest,
		diagnostics: &mut Diagnostics,
	) -> Result<SessionTokens> {
		if request.web_client_id.trim().is_empty() {
			return Err(ConfigError::MissingClientId { which: "web" }.into());
		}
		if request.ios_client_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
			return Err(ConfigError::MissingClientId { which: "ios" }.into());
		}

		let identity = self.google.sign_in(request).await?;
		let raw_nonce = auth::non_blank(identity.raw_nonce.as_ref());

		diagnostics.raw_nonce = raw_nonce.map(Secret::preview);

		let id_token = auth::non_blank(identity.id_token.as_ref()).ok_or(
			Error::InvalidProviderResponse {
				provider: Provider::Google,
				reason: "missing identity token",
			},
		)?;
		let claims = decode_claims(id_token.expose());

		if let Some(claims) = &claims {
			diagnostics.token_nonce = claims.nonce().map(mask);
			diagnostics.audience = claims.aud().map(mask);
		}

		let plan = reconcile::plan(raw_nonce, claims.as_ref(), &request.web_client_id)?;
		let response = reconcile::exchange(self.identity.as_ref(), id_token, &plan).await;

		diagnostics.nonce_retried =
			matches!(&response, Err(Error::NonceMismatch { retried: true, .. }));

		session_from(response?)
	}

	fn reject(&self, kind: FlowKind, provider: Provider) -> Error {
		obs::debug_event(kind, "sign-in rejected: another attempt is in flight");
		obs::record_flow_outcome(kind, FlowOutcome::Rejected);

		Error::AlreadyInProgress { provider }
	}
}

/// A sign-in that has published [`AuthStatus::Loading`] and owes a final state.
///
/// Dropping it unsettled (the caller abandoned the future) publishes [`AuthStatus::Error`].
struct PendingAttempt<'a> {
	publisher: &'a StatePublisher,
	kind: FlowKind,
	settled: bool,
}
impl<'a> PendingAttempt<'a> {
	fn start(publisher: &'a StatePublisher, kind: FlowKind) -> Self {
		publisher.publish(AuthState::loading());

		Self { publisher, kind, settled: false }
	}

	fn settle(mut self, result: Result<SessionTokens>) -> Result<SessionTokens> {
		self.settled = true;

		match &result {
			Ok(_) => {
				self.publisher.publish(AuthState::logged_in());
				obs::record_flow_outcome(self.kind, FlowOutcome::Success);
			},
			Err(e) => {
				self.publisher.publish(AuthState::failed(e.to_string()));
				obs::record_flow_outcome(self.kind, FlowOutcome::Failure);
			},
		}

		result
	}
}
impl Drop for PendingAttempt<'_> {
	fn drop(&mut self) {
		if self.settled {
			return;
		}

		obs::debug_event(self.kind, "sign-in abandoned before it settled");
		obs::record_flow_outcome(self.kind, FlowOutcome::Failure);
		self.publisher.publish(AuthState::failed(INTERRUPTED_MESSAGE));
	}
}

fn session_from(response: ExchangeResponse) -> Result<SessionTokens> {
	let session =
		response.session.ok_or(Error::SessionExchangeFailed { reason: "no session returned" })?;
	let access_token = auth::non_blank(session.access_token.as_ref())
		.ok_or(Error::SessionExchangeFailed { reason: "missing access token" })?;
	let refresh_token = auth::non_blank(session.refresh_token.as_ref())
		.ok_or(Error::SessionExchangeFailed { reason: "missing refresh token" })?;

	Ok(SessionTokens::new(access_token.clone(), refresh_token.clone()))
}
