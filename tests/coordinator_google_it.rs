mod common;

// std
use std::{sync::Arc, time::Duration};
// crates.io
use parking_lot::Mutex;
use serde_json::json;
// self
use common::*;
use native_auth_bridge::{
	auth::sha256_hex,
	coordinator::{AuthCoordinator, AuthState, AuthStatus},
	error::Error,
	identity::{ExchangeResponse, ExchangedSession, IdentityError},
	provider::{GoogleIdentity, GoogleSignInRequest, Provider},
};

const RAW_NONCE: &str = "raw-nonce-value-0001";

fn request() -> GoogleSignInRequest {
	GoogleSignInRequest::new(WEB_CLIENT_ID, "req-42").with_ios_client_id(IOS_CLIENT_ID)
}

fn hashed_nonce_token() -> String {
	token(json!({
		"aud": WEB_CLIENT_ID,
		"azp": IOS_CLIENT_ID,
		"iss": "https://accounts.google.com",
		"nonce": sha256_hex(RAW_NONCE),
		"sub": "1001",
	}))
}

fn setup(
	google: ScriptedGoogle,
	identity: RecordingIdentity,
) -> (Arc<AuthCoordinator>, Arc<ScriptedGoogle>, Arc<RecordingIdentity>) {
	let google = Arc::new(google);
	let identity = Arc::new(identity);
	let coordinator =
		coordinator(Arc::new(ScriptedApple::default()), google.clone(), identity.clone());

	(coordinator, google, identity)
}

#[tokio::test]
async fn token_without_nonce_claim_is_exchanged_without_nonce() {
	let id_token = token(json!({ "aud": WEB_CLIENT_ID, "sub": "1001" }));
	let (coordinator, google, identity) = setup(
		ScriptedGoogle::replying(Ok(
			GoogleIdentity::new(id_token.clone()).with_raw_nonce(RAW_NONCE)
		)),
		RecordingIdentity::replying(session_reply("access-1", "refresh-1")),
	);
	let session =
		coordinator.sign_in_with_google(request()).await.expect("Sign-in should succeed.");

	assert_eq!(session.access_token.expose(), "access-1");
	assert_eq!(session.refresh_token.expose(), "refresh-1");
	assert_eq!(
		identity.calls(),
		vec![RecordedExchange { provider: Provider::Google, id_token, nonce: None }]
	);
	assert_eq!(google.requests(), vec![request()]);
	assert_eq!(coordinator.state(), AuthState::logged_in());
}

#[tokio::test]
async fn first_exchange_uses_the_raw_nonce() {
	let (coordinator, _google, identity) = setup(
		ScriptedGoogle::replying(Ok(
			GoogleIdentity::new(hashed_nonce_token()).with_raw_nonce(RAW_NONCE)
		)),
		RecordingIdentity::replying(session_reply("access", "refresh")),
	);

	coordinator.sign_in_with_google(request()).await.expect("Sign-in should succeed.");

	let calls = identity.calls();

	assert_eq!(calls.len(), 1);
	assert_eq!(calls[0].nonce.as_deref(), Some(RAW_NONCE));
}

#[tokio::test]
async fn nonce_mismatch_retries_once_with_the_token_nonce() {
	let (coordinator, _google, identity) = setup(
		ScriptedGoogle::replying(Ok(
			GoogleIdentity::new(hashed_nonce_token()).with_raw_nonce(RAW_NONCE)
		)),
		RecordingIdentity::replying(Err(IdentityError::new("Nonces mismatch").with_status(400)))
			.then(session_reply("access", "refresh")),
	);

	coordinator.sign_in_with_google(request()).await.expect("Retry should succeed.");

	let nonces = identity.calls().into_iter().map(|call| call.nonce).collect::<Vec<_>>();

	assert_eq!(nonces, vec![Some(RAW_NONCE.to_owned()), Some(sha256_hex(RAW_NONCE))]);
	assert_eq!(coordinator.state().status, AuthStatus::LoggedIn);
}

#[tokio::test]
async fn failed_retry_is_fatal_and_carries_masked_diagnostics() {
	let (coordinator, _google, identity) = setup(
		ScriptedGoogle::replying(Ok(
			GoogleIdentity::new(hashed_nonce_token()).with_raw_nonce(RAW_NONCE)
		)),
		RecordingIdentity::replying(Err(IdentityError::new("Nonces mismatch")))
			.then(Err(IdentityError::new("Nonces mismatch"))),
	);
	let err = coordinator
		.sign_in_with_google(request())
		.await
		.expect_err("Both attempts should fail.");

	assert_eq!(identity.calls().len(), 2);
	assert!(matches!(err.root(), Error::NonceMismatch { retried: true, .. }));

	let diagnostics = err.diagnostics().expect("Google failures should carry diagnostics.");

	assert_eq!(diagnostics.request_id.as_deref(), Some("req-42"));
	assert_eq!(diagnostics.raw_nonce.as_deref(), Some("raw-no…(20)"));
	assert_eq!(
		diagnostics.token_nonce.as_deref(),
		Some(format!("{}…(64)", &sha256_hex(RAW_NONCE)[..6]).as_str())
	);
	assert!(diagnostics.nonce_retried);

	let message = err.to_string();

	assert!(message.contains("req=req-42"));
	assert!(message.contains("nonce_retry=1"));
	assert!(!message.contains(RAW_NONCE));
	assert!(!message.contains(&sha256_hex(RAW_NONCE)));
	assert!(!message.contains(WEB_CLIENT_ID));
	assert_eq!(coordinator.state().status, AuthStatus::Error);
	assert_eq!(coordinator.state().error, Some(message));
}

#[tokio::test]
async fn identical_nonces_are_not_retried() {
	let id_token = token(json!({ "aud": WEB_CLIENT_ID, "nonce": RAW_NONCE }));
	let (coordinator, _google, identity) = setup(
		ScriptedGoogle::replying(Ok(GoogleIdentity::new(id_token).with_raw_nonce(RAW_NONCE))),
		RecordingIdentity::replying(Err(IdentityError::new("Nonces mismatch"))),
	);
	let err = coordinator
		.sign_in_with_google(request())
		.await
		.expect_err("Mismatch should be fatal.");

	assert_eq!(identity.calls().len(), 1);
	assert!(matches!(err.root(), Error::NonceMismatch { retried: false, .. }));
}

#[tokio::test]
async fn other_identity_failures_are_not_retried() {
	let (coordinator, _google, identity) = setup(
		ScriptedGoogle::replying(Ok(
			GoogleIdentity::new(hashed_nonce_token()).with_raw_nonce(RAW_NONCE)
		)),
		RecordingIdentity::replying(Err(
			IdentityError::new("Invalid token signature").with_code("bad_jwt").with_status(400)
		)),
	);
	let err = coordinator
		.sign_in_with_google(request())
		.await
		.expect_err("Exchange should fail.");

	assert_eq!(identity.calls().len(), 1);
	assert!(matches!(err.root(), Error::Identity(e) if e.code.as_deref() == Some("bad_jwt")));
	assert!(err.is_retryable());
}

#[tokio::test]
async fn nonce_claim_without_raw_nonce_never_reaches_the_service() {
	let (coordinator, _google, identity) = setup(
		ScriptedGoogle::replying(Ok(GoogleIdentity::new(hashed_nonce_token()))),
		RecordingIdentity::replying(session_reply("access", "refresh")),
	);
	let err = coordinator
		.sign_in_with_google(request())
		.await
		.expect_err("Missing raw nonce should fail.");

	assert!(matches!(err.root(), Error::NonceMissingRaw));
	assert!(identity.calls().is_empty());
}

#[tokio::test]
async fn audience_mismatch_fails_before_any_exchange() {
	let id_token = token(json!({
		"aud": "9999999999-other.apps.googleusercontent.com",
		"nonce": sha256_hex(RAW_NONCE),
	}));
	let (coordinator, _google, identity) = setup(
		ScriptedGoogle::replying(Ok(GoogleIdentity::new(id_token).with_raw_nonce(RAW_NONCE))),
		RecordingIdentity::replying(session_reply("access", "refresh")),
	);
	let err = coordinator
		.sign_in_with_google(request())
		.await
		.expect_err("Audience should mismatch.");

	assert!(matches!(err.root(), Error::InvalidAudience { .. }));
	assert!(!err.is_retryable());
	assert!(identity.calls().is_empty());
	assert!(!err.to_string().contains("9999999999-other"));
}

#[tokio::test]
async fn undecodable_tokens_are_exchanged_without_nonce() {
	let (coordinator, _google, identity) = setup(
		ScriptedGoogle::replying(Ok(GoogleIdentity::new("opaque-token").with_raw_nonce(RAW_NONCE))),
		RecordingIdentity::replying(session_reply("access", "refresh")),
	);

	coordinator.sign_in_with_google(request()).await.expect("Sign-in should succeed.");

	assert_eq!(identity.calls()[0].nonce, None);
}

#[tokio::test]
async fn incomplete_results_are_rejected() {
	let (coordinator, _google, identity) = setup(
		ScriptedGoogle::replying(Ok(GoogleIdentity::default())),
		RecordingIdentity::default(),
	);
	let err = coordinator
		.sign_in_with_google(request())
		.await
		.expect_err("Missing token should fail.");

	assert!(matches!(
		err.root(),
		Error::InvalidProviderResponse {
			provider: Provider::Google,
			reason: "missing identity token",
		}
	));
	assert!(identity.calls().is_empty());

	let (coordinator, _google, _identity) = setup(
		ScriptedGoogle::replying(Ok(
			GoogleIdentity::new(hashed_nonce_token()).with_raw_nonce(RAW_NONCE)
		)),
		RecordingIdentity::replying(Ok(ExchangeResponse::from(ExchangedSession {
			access_token: Some("access".into()),
			refresh_token: None,
		}))),
	);
	let err = coordinator
		.sign_in_with_google(request())
		.await
		.expect_err("Missing refresh token should fail.");

	assert!(matches!(err.root(), Error::SessionExchangeFailed { reason: "missing refresh token" }));
}

#[tokio::test]
async fn subscribers_observe_every_transition_in_order() {
	let (coordinator, _google, _identity) = setup(
		ScriptedGoogle::replying(Ok(
			GoogleIdentity::new(hashed_nonce_token()).with_raw_nonce(RAW_NONCE)
		)),
		RecordingIdentity::replying(session_reply("access", "refresh")),
	);
	let seen = Arc::new(Mutex::new(Vec::new()));
	let sink = seen.clone();
	let subscription = coordinator.subscribe(move |state| sink.lock().push(state.status));

	coordinator.sign_in_with_google(request()).await.expect("Sign-in should succeed.");
	subscription.unsubscribe();
	coordinator.sign_out().await.expect("Sign-out should succeed.");

	assert_eq!(
		*seen.lock(),
		vec![AuthStatus::LoggedOut, AuthStatus::Loading, AuthStatus::LoggedIn]
	);
	assert_eq!(coordinator.state(), AuthState::logged_out());
}

#[tokio::test]
async fn abandoned_sign_in_leaves_an_error_state_and_frees_the_latch() {
	let gate = Gate::default();
	let (coordinator, google, identity) = setup(
		ScriptedGoogle::replying(Ok(GoogleIdentity::new(hashed_nonce_token())))
			.then(Ok(GoogleIdentity::new(token(json!({ "aud": WEB_CLIENT_ID })))))
			.gated(gate.clone()),
		RecordingIdentity::replying(session_reply("access", "refresh")),
	);
	let abandoned =
		tokio::time::timeout(Duration::from_millis(50), coordinator.sign_in_with_google(request()))
			.await;

	assert!(abandoned.is_err());
	assert_eq!(coordinator.state().status, AuthStatus::Error);
	assert!(identity.calls().is_empty());

	gate.open();

	coordinator.sign_in_with_google(request()).await.expect("Next sign-in should run.");

	assert_eq!(google.requests().len(), 2);
	assert_eq!(coordinator.state(), AuthState::logged_in());
}
