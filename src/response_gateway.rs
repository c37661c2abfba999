use async_trait::async_trait;
use eyre::{Result, WrapErr, eyre};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::ChatConfig;

/// How an exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The server was reached and answered with a non-2xx status
    HttpStatus,
    /// The request never completed: connect, DNS, timeout, aborted
    Network,
    /// 2xx, but the body is not `{"response": "<non-empty>"}`
    MalformedPayload,
}

/// Failure half of an [`ExchangeOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{detail}")]
pub struct ExchangeError {
    pub kind: FailureKind,
    pub detail: String,
}

impl ExchangeError {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Network, detail)
    }

    pub fn http_status(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::HttpStatus, detail)
    }

    pub fn malformed_payload(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::MalformedPayload, detail)
    }
}

/// Result of one request/response round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Success(String),
    Failure(ExchangeError),
}

impl ExchangeOutcome {
    pub fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::Failure(ExchangeError::new(kind, detail))
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure(error) => Some(error.kind),
        }
    }
}

/// Body of the service's root endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Performs exchanges with the remote responder.
///
/// `exchange` is total: every way a round trip can go wrong is folded into
/// [`ExchangeOutcome::Failure`], so callers never see a transport error.
/// Implementations make exactly one attempt per call and never retry.
#[async_trait]
pub trait ResponseGateway: Send + Sync {
    async fn exchange(&self, user_text: &str) -> ExchangeOutcome;

    async fn health(&self) -> Result<HealthStatus>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

pub struct HttpGateway {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().wrap_err("failed to build HTTP client")?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            client,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The service root, where the health route lives.
    fn root_url(&self) -> Url {
        let mut root = self.endpoint.clone();
        root.set_path("/");
        root.set_query(None);
        root.set_fragment(None);
        root
    }
}

#[async_trait]
impl ResponseGateway for HttpGateway {
    async fn exchange(&self, user_text: &str) -> ExchangeOutcome {
        debug!("Sending message to {}", self.endpoint);

        let response = match self
            .client
            .post(self.endpoint.clone())
            .header(ACCEPT, "application/json")
            .json(&ChatRequest { message: user_text })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let detail = describe_transport_error(&e);
                error!("Exchange failed before a response arrived: {}", detail);
                return ExchangeOutcome::failure(FailureKind::Network, detail);
            }
        };

        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            // The status line already arrived, so an unreadable body is still a rejection
            let detail = match response.text().await {
                Ok(body) => error_detail(&body),
                Err(e) => {
                    debug!("Failed to read error body: {}", e);
                    None
                }
            }
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
            warn!("Service rejected the request ({}): {}", status, detail);
            return ExchangeOutcome::Failure(ExchangeError::http_status(detail));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to read response body: {}", e);
                return ExchangeOutcome::Failure(ExchangeError::network(format!(
                    "Failed to read response: {}",
                    e
                )));
            }
        };

        match parse_reply(&body) {
            Ok(text) => {
                debug!("Received reply ({} bytes)", text.len());
                ExchangeOutcome::Success(text)
            }
            Err(e) => {
                // Only --verbose shows the raw body
                warn!("Malformed reply: {}", e);
                debug!("Malformed reply body: {}", body);
                ExchangeOutcome::Failure(e)
            }
        }
    }

    async fn health(&self) -> Result<HealthStatus> {
        let url = self.root_url();
        debug!("Probing {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .wrap_err_with(|| format!("failed to reach {}", url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(eyre!("health check returned HTTP {}", status.as_u16()));
        }

        response
            .json::<HealthStatus>()
            .await
            .wrap_err("health check returned an unexpected body")
    }
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("Request timeout: {}", e)
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        format!("Request failed: {}", e)
    }
}

/// Pulls a human-readable `detail` string out of an error body, if there is one.
fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        Value::String(detail) if !detail.trim().is_empty() => Some(detail),
        _ => None,
    }
}

fn parse_reply(body: &str) -> std::result::Result<String, ExchangeError> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
        ExchangeError::malformed_payload(format!("Failed to parse response: {}", e))
    })?;

    match parsed.response {
        Some(text) if !text.trim().is_empty() => Ok(text),
        Some(_) => Err(ExchangeError::malformed_payload("Response field is empty")),
        None => Err(ExchangeError::malformed_payload("No response data received")),
    }
}
