use reqwest::Method;

/// A request snapshot. The body is captured once, up front, so every retry
/// attempt resends the exact same bytes regardless of how the caller built
/// them (a streamed body could not survive a retry).
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl TransportRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), headers: Vec::new(), body: None }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_json_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self.headers.push(("Content-Type".to_string(), "application/json".to_string()));
        self
    }
}

/// A fully-read response. The transport buffers the body itself so a
/// non-retryable response can be handed back to the caller as plain bytes
/// rather than a still-open stream.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
