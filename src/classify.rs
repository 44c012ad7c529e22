//! Page-load failure classification.
//!
//! Native surfaces report load failures in very different shapes: Chromium `net::ERR_*` strings,
//! `NSURLErrorDomain` codes, Android `WebViewClient.ERROR_*` codes, or a bare HTTP status.
//! [`classify`] collapses them into a fixed, ordered set of categories, each with one short
//! user-facing sentence. The description text is matched first, then the numeric code; HTTP
//! status ranges participate per category.

// self
use crate::_prelude::*;

/// Canonical failure categories, in matching order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
	/// TLS handshake or certificate failure.
	Ssl,
	/// Host name resolution failure.
	Dns,
	/// Request or load timeout.
	Timeout,
	/// HTTP 5xx.
	ServerError,
	/// HTTP 4xx.
	ClientError,
	/// Offline, refused, reset, or otherwise unreachable.
	Connectivity,
	/// Nothing matched.
	Unknown,
}
impl ErrorCategory {
	const ORDERED: [ErrorCategory; 6] = [
		ErrorCategory::Ssl,
		ErrorCategory::Dns,
		ErrorCategory::Timeout,
		ErrorCategory::ServerError,
		ErrorCategory::ClientError,
		ErrorCategory::Connectivity,
	];

	/// Returns a stable label suitable for logs and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorCategory::Ssl => "ssl",
			ErrorCategory::Dns => "dns",
			ErrorCategory::Timeout => "timeout",
			ErrorCategory::ServerError => "server_error",
			ErrorCategory::ClientError => "client_error",
			ErrorCategory::Connectivity => "connectivity",
			ErrorCategory::Unknown => "unknown",
		}
	}

	/// Short, non-technical sentence shown to the user.
	pub const fn user_message(self) -> &'static str {
		match self {
			ErrorCategory::Ssl =>
				"A secure connection could not be established. Please try again later.",
			ErrorCategory::Dns =>
				"The server could not be found. Please check your internet connection.",
			ErrorCategory::Timeout => "The connection timed out. Please try again.",
			ErrorCategory::ServerError =>
				"The server is having trouble right now. Please try again in a moment.",
			ErrorCategory::ClientError => "This page could not be loaded. Please try again.",
			ErrorCategory::Connectivity =>
				"You appear to be offline. Please check your internet connection.",
			ErrorCategory::Unknown =>
				"Could not load the page. Please check your connection and try again.",
		}
	}

	fn text_patterns(self) -> &'static [&'static str] {
		match self {
			ErrorCategory::Ssl => &[
				"ssl",
				"tls",
				"cert",
				"secure connection",
				"handshake",
				"err_bad_ssl_client_auth",
			],
			ErrorCategory::Dns => &[
				"name_not_resolved",
				"name not resolved",
				"name_resolution",
				"host not found",
				"host lookup",
				"hostname could not be found",
				"specified hostname",
				"unknown host",
				"unable to resolve host",
				"dns",
			],
			ErrorCategory::Timeout => &["timed out", "timeout", "timed_out"],
			ErrorCategory::ServerError => &[
				"internal server error",
				"bad gateway",
				"service unavailable",
				"http 5",
			],
			ErrorCategory::ClientError => &["http 4"],
			ErrorCategory::Connectivity => &[
				"offline",
				"internet_disconnected",
				"internet connection",
				"network connection was lost",
				"network_changed",
				"connection_refused",
				"connection refused",
				"connection_reset",
				"connection reset",
				"connection_closed",
				"connection_failed",
				"could not connect",
				"address_unreachable",
				"network",
			],
			ErrorCategory::Unknown => &[],
		}
	}

	fn matches_code(self, code: i64) -> bool {
		match self {
			// NSURLErrorSecureConnectionFailed ... NSURLErrorClientCertificateRequired, and
			// Android ERROR_FAILED_SSL_HANDSHAKE.
			ErrorCategory::Ssl => matches!(code, -1206..=-1200 | -11),
			// NSURLErrorCannotFindHost, NSURLErrorDNSLookupFailed, Android ERROR_HOST_LOOKUP.
			ErrorCategory::Dns => matches!(code, -1003 | -1006 | -2),
			// NSURLErrorTimedOut, Android ERROR_TIMEOUT.
			ErrorCategory::Timeout => matches!(code, -1001 | -8),
			ErrorCategory::ServerError => (500..=599).contains(&code),
			ErrorCategory::ClientError => (400..=499).contains(&code),
			// Not connected, cannot connect, connection lost, roaming/call-active/data-not-allowed,
			// and Android ERROR_CONNECT / ERROR_IO.
			ErrorCategory::Connectivity =>
				matches!(code, -1009 | -1004 | -1005 | -1020..=-1018 | -6 | -7),
			ErrorCategory::Unknown => false,
		}
	}

	fn matches_status(self, status: u16) -> bool {
		match self {
			ErrorCategory::ServerError => (500..=599).contains(&status),
			ErrorCategory::ClientError => (400..=499).contains(&status),
			_ => false,
		}
	}
}
impl Display for ErrorCategory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Result of [`classify`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
	/// Matched category.
	pub category: ErrorCategory,
	/// User-facing sentence; never empty.
	pub user_message: &'static str,
	/// Whether the failure is TLS related.
	pub is_ssl: bool,
}
impl From<ErrorCategory> for Classification {
	fn from(category: ErrorCategory) -> Self {
		Self {
			category,
			user_message: category.user_message(),
			is_ssl: matches!(category, ErrorCategory::Ssl),
		}
	}
}

/// Classifies a raw load failure.
pub fn classify(
	code: Option<i64>,
	description: Option<&str>,
	status: Option<u16>,
) -> Classification {
	let text = description.map(str::to_ascii_lowercase).unwrap_or_default();
	let by_text_or_status = ErrorCategory::ORDERED.into_iter().find(|category| {
		let text_hit = !text.is_empty()
			&& category.text_patterns().iter().any(|pattern| text.contains(pattern));
		let status_hit = status.is_some_and(|status| category.matches_status(status));

		text_hit || status_hit
	});
	let category = by_text_or_status
		.or_else(|| {
			code.and_then(|code| {
				ErrorCategory::ORDERED.into_iter().find(|category| category.matches_code(code))
			})
		})
		.unwrap_or(ErrorCategory::Unknown);

	category.into()
}

/// Load failure payload as reported by the native surface.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadFailure {
	/// Platform error code.
	#[serde(default)]
	pub code: Option<i64>,
	/// Platform error description.
	#[serde(default)]
	pub description: Option<String>,
	/// URL that failed to load.
	#[serde(default)]
	pub url: Option<String>,
	/// HTTP status for HTTP-level failures.
	#[serde(default)]
	pub status_code: Option<u16>,
}

/// Error detail held by the host while its error overlay is shown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebViewErrorDetail {
	/// Platform error code, or `LOAD_TIMEOUT_CODE` for watchdog failures.
	pub code: Option<i64>,
	/// Platform error description.
	pub description: Option<String>,
	/// URL that failed to load.
	pub url: Option<String>,
	/// HTTP status, when applicable.
	pub status_code: Option<u16>,
	/// Whether the failure is TLS related.
	pub is_ssl: bool,
	/// Classified category.
	pub category: ErrorCategory,
	/// User-facing sentence.
	pub user_message: String,
}
impl WebViewErrorDetail {
	/// Code recorded for watchdog timeouts.
	pub const LOAD_TIMEOUT_CODE: i64 = -1001;
	/// User-facing sentence for watchdog timeouts.
	pub const LOAD_TIMEOUT_MESSAGE: &'static str =
		"The page is taking too long to load. Please check your connection and try again.";

	/// Builds a detail from a native failure payload.
	pub fn from_failure(failure: LoadFailure) -> Self {
		let classification =
			classify(failure.code, failure.description.as_deref(), failure.status_code);

		Self {
			code: failure.code,
			description: failure.description,
			url: failure.url,
			status_code: failure.status_code,
			is_ssl: classification.is_ssl,
			category: classification.category,
			user_message: classification.user_message.into(),
		}
	}

	/// Builds the detail recorded when the load watchdog fires.
	pub fn load_timeout(url: Option<String>) -> Self {
		Self {
			code: Some(Self::LOAD_TIMEOUT_CODE),
			description: Some("Load watchdog expired before the page became ready.".into()),
			url,
			status_code: None,
			is_ssl: false,
			category: ErrorCategory::Timeout,
			user_message: Self::LOAD_TIMEOUT_MESSAGE.into(),
		}
	}
}
