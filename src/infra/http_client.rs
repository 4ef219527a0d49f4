use crate::app::ports::{ApiRequest, HttpMethod, TransportPort};
use crate::config::{ApiConfig, SessionConfig};
use crate::error::{Result, ScannerError, TransportError};
use crate::observability::metrics;
use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

const USER_AGENT: &str = concat!("ai_event_scanner/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed transport: fixed base URL, fixed timeout, session cookie carried by a jar
pub struct ReqwestHttp {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    cookie_jar: Arc<Jar>,
    cookie_name: String,
}

impl ReqwestHttp {
    /// Builds the client; `stored_session` seeds the jar so an earlier anonymous session is resumed.
    pub fn new(api: &ApiConfig, session: &SessionConfig, stored_session: Option<&str>) -> Result<Self> {
        let base_url = Url::parse(api.base_url.trim_end_matches('/')).map_err(|e| {
            ScannerError::Config(format!("Invalid api.base_url '{}': {}", api.base_url, e))
        })?;

        let cookie_jar = Arc::new(Jar::default());
        if let Some(session_id) = stored_session {
            cookie_jar.add_cookie_str(&format!("{}={}", session.cookie_name, session_id), &base_url);
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(api.timeout())
            .cookie_provider(cookie_jar.clone())
            .build()
            .map_err(|e| ScannerError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            timeout: api.timeout(),
            cookie_jar,
            cookie_name: session.cookie_name.clone(),
        })
    }

    /// Current value of the session cookie, if the backend has issued one
    pub fn session_cookie(&self) -> Option<String> {
        let header = self.cookie_jar.cookies(&self.base_url)?;
        let header = header.to_str().ok()?;
        header.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == self.cookie_name && !value.is_empty()).then(|| value.to_string())
        })
    }

    fn url_for(&self, path: &str) -> std::result::Result<Url, TransportError> {
        let joined = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|e| TransportError::NetworkFailure(format!("invalid URL {joined}: {e}")))
    }

    async fn execute(&self, builder: reqwest::RequestBuilder) -> std::result::Result<Value, TransportError> {
        let response = builder.send().await.map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| self.classify(e))?;
        decode_response(status, &text)
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::NetworkFailure(err.to_string())
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
        }
    }
}

#[async_trait]
impl TransportPort for ReqwestHttp {
    #[instrument(skip(self, request), fields(route = %request.route()))]
    async fn send(&self, request: ApiRequest) -> std::result::Result<Value, TransportError> {
        let url = self.url_for(&request.path)?;
        let mut builder = self.client.request(request.method.into(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let outcome = self.execute(builder).await;
        metrics::transport::request_duration(started.elapsed().as_secs_f64());

        match &outcome {
            Ok(_) => {
                metrics::transport::request_success();
                debug!("Request completed");
            }
            Err(e) => {
                metrics::transport::request_error(e);
                warn!(error = %e, "Request failed");
            }
        }
        outcome
    }
}

/// Turns a status and raw body into the decoded payload or a typed error.
pub(crate) fn decode_response(status: u16, text: &str) -> std::result::Result<Value, TransportError> {
    if !(200..300).contains(&status) {
        return Err(TransportError::ServerError {
            status,
            body: text.to_string(),
            message: server_message(text),
        });
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    let value: Value = serde_json::from_str(text)
        .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;

    // The backend's exception handlers can answer 200 with an error envelope
    if value.get("error").and_then(Value::as_bool) == Some(true) {
        let status = value
            .get("status_code")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
            .unwrap_or(status);
        return Err(TransportError::ServerError {
            status,
            body: text.to_string(),
            message: server_message(text),
        });
    }
    Ok(value)
}

/// Human-readable message from an error body: FastAPI `detail` (string or validation list) or `message`.
pub(crate) fn server_message(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text).ok()?;
    match value.get("detail") {
        Some(Value::String(detail)) => return Some(detail.clone()),
        Some(Value::Array(items)) => {
            if let Some(msg) = items.iter().find_map(|item| item.get("msg").and_then(Value::as_str)) {
                return Some(msg.to_string());
            }
        }
        _ => {}
    }
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}
