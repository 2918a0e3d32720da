use reqwest::StatusCode;
use story_core::RemoteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to parse response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid adapter configuration: {0}")]
    InvalidConfig(String),
    #[error("{service} credentials are not configured")]
    MissingCredentials { service: &'static str },
    #[error("unexpected http status {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },
    #[error("operation failed after {attempts} attempts: {source}")]
    RetryExhausted {
        attempts: usize,
        #[source]
        source: Box<AdapterError>,
    },
    #[error("API returned an empty response")]
    EmptyResponse,
}

impl AdapterError {
    pub fn retry_exhausted(attempts: usize, source: AdapterError) -> Self {
        AdapterError::RetryExhausted {
            attempts,
            source: Box::new(source),
        }
    }

    /// Transport failures and error statuses may succeed on a second try;
    /// malformed or empty bodies will not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdapterError::Http(_) | AdapterError::HttpStatus { .. })
    }

    pub fn is_missing_credentials(&self) -> bool {
        matches!(self, AdapterError::MissingCredentials { .. })
    }
}

impl From<AdapterError> for RemoteError {
    fn from(error: AdapterError) -> Self {
        if error.is_missing_credentials() {
            RemoteError::not_configured(error)
        } else {
            RemoteError::new(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_and_status_errors_are_retryable() {
        let status = AdapterError::HttpStatus {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: String::new(),
        };
        assert!(status.is_retryable());
        assert!(!AdapterError::EmptyResponse.is_retryable());
        assert!(!AdapterError::InvalidConfig("x".into()).is_retryable());
        assert!(!AdapterError::MissingCredentials { service: "image" }.is_retryable());
    }

    #[test]
    fn missing_credentials_map_to_not_configured() {
        let remote: RemoteError = AdapterError::MissingCredentials { service: "speech" }.into();
        assert!(remote.is_not_configured());
        assert_eq!(remote.to_string(), "speech credentials are not configured");

        let remote: RemoteError = AdapterError::EmptyResponse.into();
        assert!(!remote.is_not_configured());
    }
}
