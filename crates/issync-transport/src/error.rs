use issync_types::ReasonCode;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("request to {url} timed out after {attempts} attempt(s)")]
    Timeout { url: String, attempts: u32 },

    #[error("request to {url} exhausted {attempts} attempt(s); last status {last_status}")]
    RetriesExhausted { url: String, attempts: u32, last_status: u16 },

    #[error("failed to read response body from {url}: {message}")]
    Body { url: String, message: String },
}

impl TransportError {
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            TransportError::RetriesExhausted { last_status, .. }
                if *last_status == 401 || *last_status == 403 =>
            {
                ReasonCode::AuthFailed
            }
            TransportError::Timeout { .. }
            | TransportError::RetriesExhausted { .. }
            | TransportError::Request { .. }
            | TransportError::Body { .. } => ReasonCode::TransportError,
        }
    }
}
