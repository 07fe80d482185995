//! A retrying wrapper over a blocking HTTP client.
//!
//! Every logical request is snapshotted once (see [`TransportRequest`]); each
//! attempt resends the same bytes with a fresh per-attempt timeout. Retryable
//! responses back off by the larger of `Retry-After` and exponential backoff;
//! transient transport errors (connect/timeout) back off the same way.
//! Non-retryable responses and permanent errors are returned immediately.

mod config;
mod error;
mod request;

pub use config::{TransportConfig, DEFAULT_RETRYABLE_STATUSES};
pub use error::TransportError;
pub use request::{TransportRequest, TransportResponse};

use issync_redact::Redactor;

/// A retrying HTTP transport, grounded on the same `reqwest::blocking::Client`
/// conventions the rest of the reference stack uses for registry calls.
#[derive(Debug, Clone)]
pub struct RetryingTransport {
    client: reqwest::blocking::Client,
    config: TransportConfig,
    redactor: Redactor,
}

impl RetryingTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            client: reqwest::blocking::Client::builder().build().unwrap_or_else(|_| reqwest::blocking::Client::new()),
            config,
            redactor: Redactor::new(),
        }
    }

    /// Register a value (an API token, a `user:token` basic-auth composite,
    /// a full `Authorization` header) that must never appear in an error
    /// message produced by this transport.
    pub fn with_secret(mut self, secret: impl AsRef<str>) -> Self {
        self.redactor.add_secret(secret);
        self
    }

    pub fn execute(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut last_status: Option<u16> = None;
        let mut last_error: Option<TransportError> = None;

        for attempt in 1..=max_attempts {
            let mut builder =
                self.client.request(request.method.clone(), &request.url).timeout(self.config.timeout);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }

            match builder.send() {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if self.config.is_retryable_status(status) {
                        if attempt < max_attempts {
                            let retry_after = parse_retry_after(response.headers());
                            let backoff = issync_retry::calculate_delay(&self.config.retry, attempt);
                            std::thread::sleep(retry_after.map(|ra| ra.max(backoff)).unwrap_or(backoff));
                            last_status = Some(status);
                            continue;
                        }
                        return Err(TransportError::RetriesExhausted {
                            url: self.redact(&request.url),
                            attempts: max_attempts,
                            last_status: status,
                        });
                    }

                    let headers = response
                        .headers()
                        .iter()
                        .map(|(name, value)| (name.to_string(), value.to_str().unwrap_or_default().to_string()))
                        .collect();
                    let body = response
                        .bytes()
                        .map_err(|e| TransportError::Body { url: self.redact(&request.url), message: self.redact(&e.to_string()) })?;
                    return Ok(TransportResponse { status, headers, body: body.to_vec() });
                }
                Err(e) => {
                    if e.is_timeout() {
                        if attempt < max_attempts {
                            let backoff = issync_retry::calculate_delay(&self.config.retry, attempt);
                            std::thread::sleep(backoff);
                            last_error = Some(TransportError::Timeout { url: self.redact(&request.url), attempts: attempt });
                            continue;
                        }
                        return Err(TransportError::Timeout { url: self.redact(&request.url), attempts: attempt });
                    }
                    if is_transient(&e) && attempt < max_attempts {
                        let backoff = issync_retry::calculate_delay(&self.config.retry, attempt);
                        std::thread::sleep(backoff);
                        last_error =
                            Some(TransportError::Request { url: self.redact(&request.url), message: self.redact(&e.to_string()) });
                        continue;
                    }
                    return Err(TransportError::Request { url: self.redact(&request.url), message: self.redact(&e.to_string()) });
                }
            }
        }

        Err(last_error.unwrap_or(TransportError::RetriesExhausted {
            url: self.redact(&request.url),
            attempts: max_attempts,
            last_status: last_status.unwrap_or(0),
        }))
    }

    fn redact(&self, text: &str) -> String {
        self.redactor.redact(text)
    }
}

fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

/// Parse a `Retry-After` header's seconds-delta form (`Retry-After: 120`).
/// The HTTP-date form is not produced by any remote adapter this transport
/// talks to and is treated as absent rather than guessed at.
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<std::time::Duration> {
    let value = headers.get(reqwest::header::RETRY_AFTER)?.to_str().ok()?;
    let seconds: u64 = value.trim().parse().ok()?;
    Some(std::time::Duration::from_secs(seconds))
}
