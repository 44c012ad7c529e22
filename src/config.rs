//! Bridge configuration supplied by the native shell.
//!
//! [`BridgeConfig`] is assembled either through [`BridgeConfigBuilder`] or deserialized from the
//! JSON document the shell ships alongside the app bundle ([`BridgeConfig::from_json`]). Both
//! paths run the same validation: the web origin must be HTTPS, the app scheme must be a valid
//! URL scheme, the load timeout must be positive, and the script hook names must be safe to
//! interpolate into injected JavaScript.

// self
use crate::_prelude::*;

const DEFAULT_LOAD_TIMEOUT_SECS: i64 = 20;
const DEFAULT_SESSION_HANDLER: &str = "__nativeAuthSetSession";
const DEFAULT_AUTH_ERROR_EVENT: &str = "native-auth-error";
const DEFAULT_OAUTH_HOSTS: [&str; 3] =
	["accounts.google.com", "appleid.apple.com", "oauth2.googleapis.com"];

/// Errors raised while constructing or validating a [`BridgeConfig`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum BridgeConfigError {
	/// The hosted web origin is required.
	#[error("Missing web origin.")]
	MissingWebOrigin,
	/// The app deep-link scheme is required.
	#[error("Missing app scheme.")]
	MissingAppScheme,
	/// The web origin must use HTTPS and carry a host.
	#[error("The web origin must be an HTTPS URL with a host: {url}.")]
	InsecureWebOrigin {
		/// Origin that failed validation.
		url: String,
	},
	/// The app scheme contains characters outside RFC 3986 scheme syntax, or is a web scheme.
	#[error("Invalid app scheme `{scheme}`.")]
	InvalidAppScheme {
		/// Scheme that failed validation.
		scheme: String,
	},
	/// The load watchdog timeout must be positive.
	#[error("The load timeout must be positive.")]
	NonPositiveLoadTimeout,
	/// A script hook name is not a plain identifier.
	#[error("The {hook} name `{value}` is not allowed.")]
	InvalidScriptHook {
		/// Which hook failed validation.
		hook: &'static str,
		/// Rejected value.
		value: String,
	},
	/// The JSON document could not be parsed.
	#[error("Bridge configuration is malformed at `{path}`: {message}.")]
	Malformed {
		/// Path of the offending field.
		path: String,
		/// Parser message.
		message: String,
	},
}

/// How navigations to OAuth provider pages inside the surface are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthNavigation {
	/// Let web-based OAuth pages load inside the surface.
	InSurface,
	/// Block them; the content is expected to use native sign-in instead.
	#[default]
	PreferNative,
}

/// Google OAuth client identifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleClientIds {
	/// iOS client identifier.
	#[serde(default)]
	pub ios_client_id: Option<String>,
	/// Web client identifier (expected token audience).
	#[serde(default)]
	pub web_client_id: Option<String>,
}

/// Validated bridge configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BridgeConfig {
	/// Hosted web origin, e.g. `https://dance.example.com`.
	pub web_origin: Url,
	/// Custom app scheme used for auth callbacks, e.g. `myapp`.
	pub app_scheme: String,
	/// Google client identifiers.
	pub google: GoogleClientIds,
	/// Load watchdog bound.
	pub load_timeout: Duration,
	/// Policy for OAuth provider pages inside the surface.
	pub oauth_navigation: OAuthNavigation,
	/// Hosts treated as OAuth provider pages.
	pub oauth_hosts: Vec<String>,
	/// Global function the content exposes to install a session.
	pub session_handler: String,
	/// Custom event name dispatched on authentication failures.
	pub auth_error_event: String,
	/// Enables debug logging of dropped messages.
	pub debug: bool,
}
impl BridgeConfig {
	/// Creates a new builder.
	pub fn builder() -> BridgeConfigBuilder {
		BridgeConfigBuilder::new()
	}

	/// Parses and validates a JSON configuration document.
	pub fn from_json(json: &str) -> Result<Self, BridgeConfigError> {
		let mut deserializer = serde_json::Deserializer::from_str(json);
		let raw: RawBridgeConfig = serde_path_to_error::deserialize(&mut deserializer).map_err(
			|e| BridgeConfigError::Malformed {
				path: e.path().to_string(),
				message: e.inner().to_string(),
			},
		)?;
		let mut builder = BridgeConfigBuilder::new()
			.web_origin(raw.web_origin)
			.app_scheme(raw.app_scheme)
			.google(raw.google)
			.oauth_navigation(raw.oauth_navigation)
			.debug(raw.debug);

		if let Some(secs) = raw.load_timeout_secs {
			builder = builder.load_timeout(Duration::seconds(secs));
		}
		if let Some(hosts) = raw.oauth_hosts {
			builder = builder.oauth_hosts(hosts);
		}
		if let Some(handler) = raw.session_handler {
			builder = builder.session_handler(handler);
		}
		if let Some(event) = raw.auth_error_event {
			builder = builder.auth_error_event(event);
		}

		builder.build()
	}

	/// Validates invariants that both construction paths rely on.
	pub fn validate(&self) -> Result<(), BridgeConfigError> {
		if self.web_origin.scheme() != "https" || self.web_origin.host_str().is_none() {
			return Err(BridgeConfigError::InsecureWebOrigin { url: self.web_origin.to_string() });
		}
		if !is_valid_scheme(&self.app_scheme) {
			return Err(BridgeConfigError::InvalidAppScheme { scheme: self.app_scheme.clone() });
		}
		if !self.load_timeout.is_positive() {
			return Err(BridgeConfigError::NonPositiveLoadTimeout);
		}
		if !is_js_identifier_path(&self.session_handler) {
			return Err(BridgeConfigError::InvalidScriptHook {
				hook: "session handler",
				value: self.session_handler.clone(),
			});
		}
		if !is_event_name(&self.auth_error_event) {
			return Err(BridgeConfigError::InvalidScriptHook {
				hook: "auth error event",
				value: self.auth_error_event.clone(),
			});
		}

		Ok(())
	}

	/// Load timeout as a std duration for platform timers.
	pub fn load_timeout_std(&self) -> std::time::Duration {
		std::time::Duration::try_from(self.load_timeout).unwrap_or_default()
	}
}

/// Builder for [`BridgeConfig`] values.
#[derive(Debug)]
pub struct BridgeConfigBuilder {
	/// Hosted web origin.
	pub web_origin: Option<Url>,
	/// App deep-link scheme.
	pub app_scheme: Option<String>,
	/// Google client identifiers.
	pub google: GoogleClientIds,
	/// Load watchdog bound.
	pub load_timeout: Duration,
	/// OAuth navigation policy.
	pub oauth_navigation: OAuthNavigation,
	/// OAuth provider hosts.
	pub oauth_hosts: Vec<String>,
	/// Session handler function name.
	pub session_handler: String,
	/// Auth error event name.
	pub auth_error_event: String,
	/// Debug logging toggle.
	pub debug: bool,
}
impl BridgeConfigBuilder {
	/// Creates a builder seeded with defaults.
	pub fn new() -> Self {
		Self {
			web_origin: None,
			app_scheme: None,
			google: GoogleClientIds::default(),
			load_timeout: Duration::seconds(DEFAULT_LOAD_TIMEOUT_SECS),
			oauth_navigation: OAuthNavigation::default(),
			oauth_hosts: DEFAULT_OAUTH_HOSTS.iter().map(|host| (*host).to_owned()).collect(),
			session_handler: DEFAULT_SESSION_HANDLER.into(),
			auth_error_event: DEFAULT_AUTH_ERROR_EVENT.into(),
			debug: false,
		}
	}

	/// Sets the hosted web origin.
	pub fn web_origin(mut self, url: Url) -> Self {
		self.web_origin = Some(url);

		self
	}

	/// Sets the app deep-link scheme.
	pub fn app_scheme(mut self, scheme: impl Into<String>) -> Self {
		self.app_scheme = Some(scheme.into());

		self
	}

	/// Sets the Google client identifiers.
	pub fn google(mut self, google: GoogleClientIds) -> Self {
		self.google = google;

		self
	}

	/// Sets the Google web client identifier.
	pub fn google_web_client_id(mut self, client_id: impl Into<String>) -> Self {
		self.google.web_client_id = Some(client_id.into());

		self
	}

	/// Sets the Google iOS client identifier.
	pub fn google_ios_client_id(mut self, client_id: impl Into<String>) -> Self {
		self.google.ios_client_id = Some(client_id.into());

		self
	}

	/// Overrides the load watchdog bound.
	pub fn load_timeout(mut self, timeout: Duration) -> Self {
		self.load_timeout = timeout;

		self
	}

	/// Overrides the OAuth navigation policy.
	pub fn oauth_navigation(mut self, policy: OAuthNavigation) -> Self {
		self.oauth_navigation = policy;

		self
	}

	/// Replaces the OAuth provider host list.
	pub fn oauth_hosts<I, S>(mut self, hosts: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.oauth_hosts = hosts.into_iter().map(Into::into).collect();

		self
	}

	/// Overrides the session handler function name.
	pub fn session_handler(mut self, name: impl Into<String>) -> Self {
		self.session_handler = name.into();

		self
	}

	/// Overrides the auth error event name.
	pub fn auth_error_event(mut self, name: impl Into<String>) -> Self {
		self.auth_error_event = name.into();

		self
	}

	/// Toggles debug logging.
	pub fn debug(mut self, debug: bool) -> Self {
		self.debug = debug;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<BridgeConfig, BridgeConfigError> {
		let web_origin = self.web_origin.ok_or(BridgeConfigError::MissingWebOrigin)?;
		let app_scheme = self
			.app_scheme
			.map(|scheme| scheme.trim().trim_end_matches("://").to_ascii_lowercase())
			.filter(|scheme| !scheme.is_empty())
			.ok_or(BridgeConfigError::MissingAppScheme)?;
		let config = BridgeConfig {
			web_origin,
			app_scheme,
			google: self.google,
			load_timeout: self.load_timeout,
			oauth_navigation: self.oauth_navigation,
			oauth_hosts: self
				.oauth_hosts
				.into_iter()
				.map(|host| host.to_ascii_lowercase())
				.collect(),
			session_handler: self.session_handler,
			auth_error_event: self.auth_error_event,
			debug: self.debug,
		};

		config.validate()?;

		Ok(config)
	}
}
impl Default for BridgeConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBridgeConfig {
	web_origin: Url,
	app_scheme: String,
	#[serde(default)]
	google: GoogleClientIds,
	#[serde(default)]
	load_timeout_secs: Option<i64>,
	#[serde(default)]
	oauth_navigation: OAuthNavigation,
	#[serde(default)]
	oauth_hosts: Option<Vec<String>>,
	#[serde(default)]
	session_handler: Option<String>,
	#[serde(default)]
	auth_error_event: Option<String>,
	#[serde(default)]
	debug: bool,
}

fn is_valid_scheme(scheme: &str) -> bool {
	let mut chars = scheme.chars();
	let starts_alpha = chars.next().is_some_and(|ch| ch.is_ascii_alphabetic());
	let rest_valid =
		chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'));

	starts_alpha && rest_valid && !matches!(scheme, "http" | "https" | "about" | "javascript")
}

fn is_js_identifier_path(name: &str) -> bool {
	!name.is_empty()
		&& name.split('.').all(|segment| {
			let mut chars = segment.chars();

			chars.next().is_some_and(|ch| ch.is_ascii_alphabetic() || matches!(ch, '_' | '$'))
				&& chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '$'))
		})
}

fn is_event_name(name: &str) -> bool {
	!name.is_empty()
		&& name.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | ':' | '.'))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn origin(value: &str) -> Url {
		Url::parse(value).expect("Origin fixture should parse.")
	}

	#[test]
	fn builder_applies_defaults_and_normalizes_scheme() {
		let config = BridgeConfig::builder()
			.web_origin(origin("https://dance.example.com"))
			.app_scheme("DanceApp://")
			.build()
			.expect("Config should build.");

		assert_eq!(config.app_scheme, "danceapp");
		assert_eq!(config.load_timeout, Duration::seconds(20));
		assert_eq!(config.oauth_navigation, OAuthNavigation::PreferNative);
		assert_eq!(config.session_handler, "__nativeAuthSetSession");
		assert_eq!(config.auth_error_event, "native-auth-error");
		assert!(config.oauth_hosts.iter().any(|host| host == "accounts.google.com"));
		assert_eq!(config.load_timeout_std(), std::time::Duration::from_secs(20));
	}

	#[test]
	fn builder_rejects_invalid_values() {
		let err = BridgeConfig::builder()
			.web_origin(origin("http://dance.example.com"))
			.app_scheme("myapp")
			.build()
			.expect_err("Plain HTTP origins should be rejected.");

		assert!(matches!(err, BridgeConfigError::InsecureWebOrigin { .. }));

		let err = BridgeConfig::builder()
			.web_origin(origin("https://dance.example.com"))
			.app_scheme("https")
			.build()
			.expect_err("Web schemes cannot be app schemes.");

		assert!(matches!(err, BridgeConfigError::InvalidAppScheme { .. }));

		let err = BridgeConfig::builder()
			.web_origin(origin("https://dance.example.com"))
			.app_scheme("myapp")
			.load_timeout(Duration::ZERO)
			.build()
			.expect_err("Zero timeouts should be rejected.");

		assert_eq!(err, BridgeConfigError::NonPositiveLoadTimeout);

		let err = BridgeConfig::builder()
			.web_origin(origin("https://dance.example.com"))
			.app_scheme("myapp")
			.session_handler("alert(1);x")
			.build()
			.expect_err("Script fragments should be rejected as hook names.");

		assert!(matches!(
			err,
			BridgeConfigError::InvalidScriptHook { hook: "session handler", .. }
		));
		assert_eq!(
			BridgeConfig::builder().app_scheme("myapp").build(),
			Err(BridgeConfigError::MissingWebOrigin)
		);
	}

	#[test]
	fn json_documents_are_parsed_and_validated() {
		let config = BridgeConfig::from_json(
			r#"{
				"webOrigin": "https://dance.example.com",
				"appScheme": "myapp",
				"google": { "web_client_id": "web.apps.googleusercontent.com" },
				"loadTimeoutSecs": 15,
				"oauthNavigation": "in_surface",
				"sessionHandler": "app.auth.setSession",
				"debug": true
			}"#,
		)
		.expect("Config document should parse.");

		assert_eq!(config.google.web_client_id.as_deref(), Some("web.apps.googleusercontent.com"));
		assert_eq!(config.load_timeout, Duration::seconds(15));
		assert_eq!(config.oauth_navigation, OAuthNavigation::InSurface);
		assert_eq!(config.session_handler, "app.auth.setSession");
		assert!(config.debug);
	}

	#[test]
	fn malformed_json_reports_the_field_path() {
		let err = BridgeConfig::from_json(concat!(
			r#"{ "webOrigin": "https://dance.example.com", "appScheme": "myapp","#,
			r#" "loadTimeoutSecs": "soon" }"#,
		))
		.expect_err("String timeouts should be rejected.");

		assert!(matches!(
			err,
			BridgeConfigError::Malformed { ref path, .. } if path == "loadTimeoutSecs"
		));
	}
}
