//! Deep-link rewriting and navigation interception policy.
//!
//! [`DeepLinkRouter`] maps inbound deep links (the app's custom scheme or universal links on the
//! hosted origin) to URLs on the hosted web surface. [`NavigationPolicy`] decides, before any
//! navigation inside the surface starts, whether it stays in-surface, is routed as a deep link,
//! is handed to the platform URL opener, or is blocked.

// self
use crate::{
	_prelude::*,
	config::{BridgeConfig, OAuthNavigation},
};

/// Path used when an app-scheme link carries no path at all.
pub const DEFAULT_CALLBACK_PATH: &str = "/auth/callback";

/// Rewrites app-scheme and universal links into hosted web URLs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeepLinkRouter {
	web_origin: Url,
	app_scheme: String,
}
impl DeepLinkRouter {
	/// Creates a router for the given origin and app scheme.
	pub fn new(web_origin: Url, app_scheme: impl Into<String>) -> Self {
		Self { web_origin, app_scheme: app_scheme.into().to_ascii_lowercase() }
	}

	/// Creates a router from a validated configuration.
	pub fn from_config(config: &BridgeConfig) -> Self {
		Self::new(config.web_origin.clone(), config.app_scheme.clone())
	}

	/// Hosted web origin.
	pub fn web_origin(&self) -> &Url {
		&self.web_origin
	}

	/// Maps an inbound URL to the equivalent hosted web URL.
	///
	/// Returns `None` when the URL is not a routable deep link; callers then fall back to the
	/// platform's default handling.
	pub fn map_incoming_url(&self, url: &str) -> Option<Url> {
		let parsed = Url::parse(url.trim()).ok()?;

		if self.is_app_scheme(&parsed) {
			return Some(self.rewrite_app_link(&parsed));
		}
		if parsed.scheme() == "https" && self.is_web_host(&parsed) {
			return Some(parsed);
		}

		None
	}

	/// Script that navigates the surface to an already mapped URL without reloading the shell.
	pub fn navigation_script(&self, url: &Url) -> String {
		crate::host::script::navigate(url)
	}

	/// Returns `true` when the URL uses the app's custom scheme.
	pub fn is_app_scheme(&self, url: &Url) -> bool {
		url.scheme() == self.app_scheme
	}

	/// Returns `true` when the URL's host is the hosted origin or its `www` variant.
	pub fn is_web_host(&self, url: &Url) -> bool {
		let (Some(host), Some(origin)) = (url.host_str(), self.web_origin.host_str()) else {
			return false;
		};
		let host = host.to_ascii_lowercase();
		let bare = origin.to_ascii_lowercase();
		let bare = bare.strip_prefix("www.").unwrap_or(&bare);

		host == bare || host.strip_prefix("www.") == Some(bare)
	}

	fn rewrite_app_link(&self, url: &Url) -> Url {
		let mut path = String::new();

		if let Some(host) = url.host_str().filter(|host| !host.is_empty()) {
			path.push('/');
			path.push_str(host);
		}

		let own = url.path();

		if !own.is_empty() && own != "/" {
			if !own.starts_with('/') {
				path.push('/');
			}

			path.push_str(own);
		}
		if path.is_empty() {
			path.push_str(DEFAULT_CALLBACK_PATH);
		}

		let mut target = self.web_origin.clone();

		target.set_path(&path);
		target.set_query(url.query());
		target.set_fragment(url.fragment());

		target
	}
}

/// Outcome of [`NavigationPolicy::decide`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigationDecision {
	/// Let the surface load the URL.
	Allow,
	/// Cancel the navigation and route the mapped URL into the surface.
	RouteDeepLink(Url),
	/// Cancel the navigation and hand the URL to the platform opener.
	OpenExternal(Url),
	/// Cancel the navigation without further action.
	Block,
}
impl NavigationDecision {
	/// Returns `true` when the surface must not perform the navigation itself.
	pub fn cancels_navigation(&self) -> bool {
		!matches!(self, NavigationDecision::Allow)
	}
}

/// Classifies navigation targets before the surface loads them.
#[derive(Clone, Debug)]
pub struct NavigationPolicy {
	router: DeepLinkRouter,
	oauth_hosts: Vec<String>,
	oauth_navigation: OAuthNavigation,
}
impl NavigationPolicy {
	/// Creates a policy from a validated configuration.
	pub fn from_config(config: &BridgeConfig) -> Self {
		Self {
			router: DeepLinkRouter::from_config(config),
			oauth_hosts: config.oauth_hosts.clone(),
			oauth_navigation: config.oauth_navigation,
		}
	}

	/// Deep-link router used for app-scheme targets.
	pub fn router(&self) -> &DeepLinkRouter {
		&self.router
	}

	/// Decides how a navigation to `url` is handled.
	pub fn decide(&self, url: &str) -> NavigationDecision {
		let Ok(parsed) = Url::parse(url.trim()) else {
			return NavigationDecision::Block;
		};

		if self.router.is_app_scheme(&parsed) {
			return match self.router.map_incoming_url(parsed.as_str()) {
				Some(mapped) => NavigationDecision::RouteDeepLink(mapped),
				None => NavigationDecision::Block,
			};
		}

		match parsed.scheme() {
			"about" => NavigationDecision::Allow,
			"http" | "https" => self.decide_web(parsed),
			_ => NavigationDecision::OpenExternal(parsed),
		}
	}

	fn decide_web(&self, url: Url) -> NavigationDecision {
		if is_calendar_file(&url) {
			return NavigationDecision::OpenExternal(url);
		}
		if self.router.is_web_host(&url) {
			return NavigationDecision::Allow;
		}
		if self.is_oauth_host(&url) {
			return match self.oauth_navigation {
				OAuthNavigation::InSurface => NavigationDecision::Allow,
				OAuthNavigation::PreferNative => NavigationDecision::Block,
			};
		}

		NavigationDecision::OpenExternal(url)
	}

	fn is_oauth_host(&self, url: &Url) -> bool {
		let Some(host) = url.host_str().map(str::to_ascii_lowercase) else {
			return false;
		};

		self.oauth_hosts.iter().any(|known| {
			host == *known
				|| host.strip_suffix(known.as_str()).is_some_and(|rest| rest.ends_with('.'))
		})
	}
}

fn is_calendar_file(url: &Url) -> bool {
	url.path().to_ascii_lowercase().ends_with(".ics")
}
