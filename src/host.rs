//! Embedded content host: page-load lifecycle, inbound messages, and outbound scripts.
//!
//! The host sits between the native surface (a web view) and the [`AuthCoordinator`]. The surface
//! reports navigation and load events and forwards raw messages; the host answers through the
//! [`ContentSurface`] callbacks. Inbound messages are treated as untrusted input and
//! shape-checked before anything runs.

pub mod message;
pub mod script;
pub mod watchdog;

pub use message::*;
pub use watchdog::*;

// self
use crate::{
	_prelude::*,
	auth::{self, SessionTokens},
	classify::{LoadFailure, WebViewErrorDetail},
	config::BridgeConfig,
	coordinator::{AuthCoordinator, AuthState, Subscription},
	obs::{self, FlowKind, FlowOutcome},
	provider::{GoogleSignInRequest, Provider},
	router::{NavigationDecision, NavigationPolicy},
};

const GENERATED_REQUEST_ID_LEN: usize = 12;

/// Callbacks into the native surface.
pub trait ContentSurface: Send + Sync {
	/// Evaluates `script` in the embedded content.
	fn inject_script(&self, script: &str);

	/// Hands `url` to the platform opener (browser, calendar, mail, ...).
	fn open_external(&self, url: &Url);

	/// Schedules a timer that calls [`EmbeddedContentHost::on_watchdog_fired`] with `ticket`.
	fn schedule_watchdog(&self, ticket: WatchdogTicket, after: std::time::Duration);

	/// Reloads the current page.
	fn reload(&self);
}

/// Page-load phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HostPhase {
	/// Nothing has been loaded yet.
	#[default]
	Idle,
	/// A navigation is in progress; the watchdog is armed.
	Loading,
	/// The page finished loading.
	Ready,
	/// The page failed to load; see [`EmbeddedContentHost::error_detail`].
	Error,
}

/// What [`EmbeddedContentHost::handle_message`] did with a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageOutcome {
	/// Not JSON, or not a known message shape.
	Dropped,
	/// `READY` was recorded; `first` is `false` for repeats.
	Ready {
		/// Whether this was the first `READY` for the current page.
		first: bool,
	},
	/// Another auth message is still being serviced.
	Busy,
	/// Sign-in succeeded and the session script was injected.
	SessionInstalled,
	/// Sign-out completed.
	SignedOut,
	/// The operation failed and the auth error event was dispatched.
	ErrorDispatched,
}

/// Hosts the embedded content and bridges it to native sign-in.
pub struct EmbeddedContentHost {
	config: BridgeConfig,
	policy: NavigationPolicy,
	coordinator: Arc<AuthCoordinator>,
	surface: Arc<dyn ContentSurface>,
	page: Mutex<PageState>,
	auth_mirror: Arc<RwLock<AuthState>>,
	auth_guard: AsyncMutex<()>,
	_auth_subscription: Subscription,
}
impl EmbeddedContentHost {
	/// Creates a host and starts mirroring the coordinator's auth state.
	pub fn new(
		config: BridgeConfig,
		coordinator: Arc<AuthCoordinator>,
		surface: Arc<dyn ContentSurface>,
	) -> Self {
		let auth_mirror = Arc::new(RwLock::new(AuthState::default()));
		let sink = auth_mirror.clone();
		let subscription = coordinator.subscribe(move |state| *sink.write() = state.clone());

		Self {
			policy: NavigationPolicy::from_config(&config),
			config,
			coordinator,
			surface,
			page: Mutex::new(PageState::default()),
			auth_mirror,
			auth_guard: AsyncMutex::new(()),
			_auth_subscription: subscription,
		}
	}

	/// Configuration the host was built with.
	pub fn config(&self) -> &BridgeConfig {
		&self.config
	}

	/// Coordinator the host delegates auth messages to.
	pub fn coordinator(&self) -> &Arc<AuthCoordinator> {
		&self.coordinator
	}

	/// Current page-load phase.
	pub fn phase(&self) -> HostPhase {
		self.page.lock().phase
	}

	/// Error shown by the host, if any.
	pub fn error_detail(&self) -> Option<WebViewErrorDetail> {
		self.page.lock().error.clone()
	}

	/// Mirror of the coordinator's auth state.
	pub fn auth_state(&self) -> AuthState {
		self.auth_mirror.read().clone()
	}

	/// Whether the current page has sent `READY`.
	pub fn is_handshake_complete(&self) -> bool {
		self.page.lock().handshake_complete
	}

	/// A navigation started: clears the error, enters [`HostPhase::Loading`] and arms the
	/// watchdog.
	pub fn on_navigation_start(&self, url: &str) {
		let ticket = {
			let mut page = self.page.lock();

			page.phase = HostPhase::Loading;
			page.error = None;
			page.handshake_complete = false;
			page.url = Some(url.to_owned());

			page.watchdog.arm()
		};

		obs::record_flow_outcome(FlowKind::PageLoad, FlowOutcome::Attempt);
		self.surface.schedule_watchdog(ticket, self.config.load_timeout_std());
	}

	/// The surface finished loading the page.
	pub fn on_load_finished(&self) {
		self.finish_loading();
	}

	/// The surface failed to load the page.
	pub fn on_load_error(&self, failure: LoadFailure) {
		self.fail(WebViewErrorDetail::from_failure(failure));
	}

	/// The main document answered with an HTTP error. Statuses below 400 are ignored.
	pub fn on_http_error(&self, status: u16, url: Option<&str>) -> bool {
		if status < 400 {
			return false;
		}

		self.fail(WebViewErrorDetail::from_failure(LoadFailure {
			url: url.map(str::to_owned),
			status_code: Some(status),
			..Default::default()
		}));

		true
	}

	/// The surface's watchdog timer elapsed. Returns `true` when it moved the host to
	/// [`HostPhase::Error`].
	pub fn on_watchdog_fired(&self, ticket: WatchdogTicket) -> bool {
		let detail = {
			let mut page = self.page.lock();

			if !page.watchdog.fire(ticket) {
				return false;
			}

			let detail = WebViewErrorDetail::load_timeout(page.url.clone());

			page.phase = HostPhase::Error;
			page.error = Some(detail.clone());

			detail
		};

		record_failure(&detail);

		true
	}

	/// Handles one raw message from the embedded content.
	pub async fn handle_message(&self, raw: &str) -> MessageOutcome {
		let message = match BridgeMessage::parse(raw) {
			Ok(message) => message,
			Err(e) => {
				if self.config.debug {
					obs::debug_event(FlowKind::PageLoad, &format!("dropped bridge message: {e}"));
				}

				return MessageOutcome::Dropped;
			},
		};

		match message {
			BridgeMessage::Ready => MessageOutcome::Ready { first: self.mark_ready() },
			BridgeMessage::NativeAuthApple => self.sign_in(Provider::Apple, None).await,
			BridgeMessage::NativeAuthGoogle { request_id } =>
				self.sign_in(Provider::Google, request_id).await,
			BridgeMessage::NativeSignOut => self.sign_out().await,
		}
	}

	/// Decides whether the surface may perform a navigation.
	///
	/// Cancelled navigations are routed, opened externally, or dropped; each also clears the
	/// loading state and disarms the watchdog.
	pub fn should_start_navigation(&self, url: &str) -> bool {
		match self.policy.decide(url) {
			NavigationDecision::Allow => return true,
			NavigationDecision::RouteDeepLink(mapped) =>
				self.surface.inject_script(&self.policy.router().navigation_script(&mapped)),
			NavigationDecision::OpenExternal(target) => self.surface.open_external(&target),
			NavigationDecision::Block => {
				if self.config.debug {
					obs::debug_event(FlowKind::PageLoad, "blocked navigation");
				}
			},
		}

		self.cancel_loading();

		false
	}

	/// Routes an OS-delivered deep link into the content. Returns `false` when the link is not
	/// routable and the caller should fall back to default handling.
	pub fn open_deep_link(&self, url: &str) -> bool {
		let Some(mapped) = self.policy.router().map_incoming_url(url) else {
			return false;
		};

		self.surface.inject_script(&self.policy.router().navigation_script(&mapped));

		true
	}

	/// Manual retry from the error surface: clears the error and reloads.
	pub fn retry(&self) {
		{
			let mut page = self.page.lock();

			page.error = None;
			page.phase = HostPhase::Idle;
			page.watchdog.disarm();
		}

		self.surface.reload();
	}

	async fn sign_in(&self, provider: Provider, request_id: Option<String>) -> MessageOutcome {
		let Some(_guard) = self.auth_guard.try_lock() else {
			return self.busy();
		};
		let result = match provider {
			Provider::Apple => self.coordinator.sign_in_with_apple().await,
			Provider::Google =>
				self.coordinator.sign_in_with_google(self.google_request(request_id)).await,
		};

		match result {
			Ok(session) => {
				self.install_session(&session);

				MessageOutcome::SessionInstalled
			},
			Err(e) => self.dispatch_error(&e),
		}
	}

	async fn sign_out(&self) -> MessageOutcome {
		let Some(_guard) = self.auth_guard.try_lock() else {
			return self.busy();
		};

		match self.coordinator.sign_out().await {
			Ok(()) => MessageOutcome::SignedOut,
			Err(e) => self.dispatch_error(&e),
		}
	}

	fn google_request(&self, request_id: Option<String>) -> GoogleSignInRequest {
		let request_id = request_id
			.filter(|id| !id.trim().is_empty())
			.unwrap_or_else(|| auth::random_string(GENERATED_REQUEST_ID_LEN));
		let web_client_id = self.config.google.web_client_id.clone().unwrap_or_default();
		let request = GoogleSignInRequest::new(web_client_id, request_id);

		match &self.config.google.ios_client_id {
			Some(ios_client_id) => request.with_ios_client_id(ios_client_id.clone()),
			None => request,
		}
	}

	fn install_session(&self, session: &SessionTokens) {
		self.surface.inject_script(&script::install_session(&self.config.session_handler, session));
	}

	fn dispatch_error(&self, error: &Error) -> MessageOutcome {
		self.surface
			.inject_script(&script::auth_error(&self.config.auth_error_event, &error.to_string()));

		MessageOutcome::ErrorDispatched
	}

	fn busy(&self) -> MessageOutcome {
		if self.config.debug {
			obs::debug_event(FlowKind::PageLoad, "auth message ignored: another one is in flight");
		}

		MessageOutcome::Busy
	}

	fn mark_ready(&self) -> bool {
		let mut page = self.page.lock();
		let first = !page.handshake_complete;

		page.handshake_complete = true;
		drop(page);

		self.finish_loading();

		first
	}

	fn finish_loading(&self) {
		let finished = {
			let mut page = self.page.lock();

			page.watchdog.disarm();

			if matches!(page.phase, HostPhase::Idle | HostPhase::Loading) {
				page.phase = HostPhase::Ready;

				true
			} else {
				false
			}
		};

		if finished {
			obs::record_flow_outcome(FlowKind::PageLoad, FlowOutcome::Success);
		}
	}

	fn cancel_loading(&self) {
		let mut page = self.page.lock();

		page.watchdog.disarm();

		if page.phase == HostPhase::Loading {
			page.phase = if page.handshake_complete { HostPhase::Ready } else { HostPhase::Idle };
		}
	}

	fn fail(&self, detail: WebViewErrorDetail) {
		{
			let mut page = self.page.lock();

			page.watchdog.disarm();
			page.phase = HostPhase::Error;
			page.error = Some(detail.clone());
		}

		record_failure(&detail);
	}
}

#[derive(Debug, Default)]
struct PageState {
	phase: HostPhase,
	error: Option<WebViewErrorDetail>,
	watchdog: LoadWatchdog,
	handshake_complete: bool,
	url: Option<String>,
}

fn record_failure(detail: &WebViewErrorDetail) {
	obs::record_load_failure(detail.category.as_str());
	obs::record_flow_outcome(FlowKind::PageLoad, FlowOutcome::Failure);
}
