use issync_fs::FsError;
use issync_types::ReasonCode;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Fs(#[from] FsError),
    #[error("cache at {path} is malformed: {source}")]
    MalformedCache {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn reason_code(&self) -> ReasonCode {
        ReasonCode::ValidationFailed
    }
}
