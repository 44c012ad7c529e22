//! GoTrue-compatible [`IdentityService`] backed by reqwest.
//!
//! `exchange` posts the identity token to `{base}/auth/v1/token?grant_type=id_token` and reads
//! the session from the response body. The last issued access token is kept in memory only so
//! `invalidate_session` can call `{base}/auth/v1/logout` with it; nothing is written to disk.

// self
use crate::{
	_prelude::*,
	auth::Secret,
	identity::{
		ExchangeRequest, ExchangeResponse, ExchangedSession, IdentityError, IdentityFuture,
		IdentityService,
	},
};

/// reqwest-backed identity service speaking the GoTrue REST dialect.
#[derive(Clone)]
pub struct HttpIdentityService {
	http: ReqwestClient,
	base_url: Url,
	api_key: Secret,
	current: Arc<Mutex<Option<Secret>>>,
}
impl HttpIdentityService {
	/// Creates a client for the project at `base_url` using the public `api_key`.
	pub fn new(base_url: Url, api_key: impl Into<Secret>) -> Self {
		Self::with_client(ReqwestClient::default(), base_url, api_key)
	}

	/// Reuses an existing reqwest client.
	pub fn with_client(http: ReqwestClient, base_url: Url, api_key: impl Into<Secret>) -> Self {
		Self { http, base_url, api_key: api_key.into(), current: Default::default() }
	}

	/// Base URL of the identity project.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	fn endpoint(&self, path: &str) -> Result<Url, IdentityError> {
		let base = self.base_url.as_str().trim_end_matches('/');

		Url::parse(&format!("{base}/auth/v1/{path}"))
			.map_err(|e| IdentityError::new(format!("Invalid identity endpoint: {e}.")))
	}

	async fn exchange_now(
		&self,
		request: ExchangeRequest<'_>,
	) -> Result<ExchangeResponse, IdentityError> {
		let mut url = self.endpoint("token")?;

		url.query_pairs_mut().append_pair("grant_type", "id_token");

		let body = IdTokenGrant {
			provider: request.provider.as_str(),
			id_token: request.id_token.expose(),
			nonce: request.nonce.map(Secret::expose),
		};
		let response = self
			.http
			.post(url)
			.header("apikey", self.api_key.expose())
			.json(&body)
			.send()
			.await
			.map_err(map_reqwest_error)?;
		let status = response.status().as_u16();
		let bytes = response.bytes().await.map_err(map_reqwest_error)?;

		if status >= 400 {
			return Err(parse_error_body(status, &bytes));
		}

		let session = parse_session_body(&bytes).map_err(|e| e.with_status(status))?;

		*self.current.lock() = session.access_token.clone();

		Ok(session.into())
	}

	async fn logout_now(&self) -> Result<(), IdentityError> {
		let cached = self.current.lock().clone();
		let Some(access_token) = cached else {
			return Ok(());
		};
		let mut url = self.endpoint("logout")?;

		url.query_pairs_mut().append_pair("scope", "local");

		let response = self
			.http
			.post(url)
			.header("apikey", self.api_key.expose())
			.bearer_auth(access_token.expose())
			.send()
			.await
			.map_err(map_reqwest_error)?;
		let status = response.status().as_u16();

		// Already-expired sessions are gone server-side as well.
		if status >= 400 && !matches!(status, 401 | 403 | 404) {
			let bytes = response.bytes().await.map_err(map_reqwest_error)?;

			return Err(parse_error_body(status, &bytes));
		}

		*self.current.lock() = None;

		Ok(())
	}
}
impl IdentityService for HttpIdentityService {
	fn exchange<'a>(
		&'a self,
		request: ExchangeRequest<'a>,
	) -> IdentityFuture<'a, ExchangeResponse> {
		Box::pin(self.exchange_now(request))
	}

	fn invalidate_session(&self) -> IdentityFuture<'_, ()> {
		Box::pin(self.logout_now())
	}
}
impl Debug for HttpIdentityService {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpIdentityService")
			.field("base_url", &self.base_url.as_str())
			.field("api_key", &self.api_key)
			.field("session_cached", &self.current.lock().is_some())
			.finish()
	}
}

#[derive(Serialize)]
struct IdTokenGrant<'a> {
	provider: &'a str,
	id_token: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	nonce: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
	#[serde(default)]
	error_code: Option<String>,
	#[serde(default)]
	code: Option<serde_json::Value>,
	#[serde(default)]
	error: Option<String>,
	#[serde(default)]
	msg: Option<String>,
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	error_description: Option<String>,
}

fn parse_session_body(bytes: &[u8]) -> Result<ExchangedSession, IdentityError> {
	let mut deserializer = serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize::<_, ExchangedSession>(&mut deserializer).map_err(|e| {
		IdentityError::new(format!("Identity service returned malformed JSON at `{}`.", e.path()))
			.with_code("malformed_response")
	})
}

fn parse_error_body(status: u16, bytes: &[u8]) -> IdentityError {
	let body = serde_json::from_slice::<ErrorBody>(bytes).unwrap_or_default();
	let message = body
		.msg
		.or(body.message)
		.or(body.error_description)
		.or_else(|| body.error.clone())
		.unwrap_or_else(|| format!("Identity service responded with HTTP {status}."));
	let code = body
		.error_code
		.or_else(|| match body.code {
			Some(serde_json::Value::String(code)) => Some(code),
			_ => None,
		})
		.or(body.error);
	let mut err = IdentityError::new(message).with_status(status);

	err.code = code;

	err
}

fn map_reqwest_error(err: ReqwestError) -> IdentityError {
	let code = if err.is_timeout() {
		"timeout"
	} else if err.is_connect() {
		"connect"
	} else if err.is_decode() {
		"decode"
	} else {
		"network"
	};
	let mut mapped =
		IdentityError::new(format!("Network error while calling the identity service: {err}."))
			.with_code(code);

	mapped.status = err.status().map(|status| status.as_u16());

	mapped
}
