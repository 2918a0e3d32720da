use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RemoteErrorKind {
    /// Credentials or endpoint are missing; no request was made.
    NotConfigured,
    Failed,
}

/// Error returned by any hosted-service collaborator.
#[derive(Debug)]
pub struct RemoteError {
    kind: RemoteErrorKind,
    inner: Box<dyn StdError + Send + Sync>,
}

impl RemoteError {
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            kind: RemoteErrorKind::Failed,
            inner: Box::new(error),
        }
    }

    pub fn not_configured<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            kind: RemoteErrorKind::NotConfigured,
            inner: Box::new(error),
        }
    }

    pub fn kind(&self) -> RemoteErrorKind {
        self.kind
    }

    pub fn is_not_configured(&self) -> bool {
        self.kind == RemoteErrorKind::NotConfigured
    }

    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync> {
        self.inner
    }

    pub fn as_inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.inner.as_ref()
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl StdError for RemoteError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.inner.as_ref())
    }
}

pub trait LanguageModel: Send + Sync {
    fn invoke(&self, prompt: &str, max_tokens: u32) -> Result<String, RemoteError>;
}

/// Returns the URL of the generated image.
pub trait ImageGenerator: Send + Sync {
    fn generate_image(&self, prompt: &str) -> Result<String, RemoteError>;
}

/// Returns raw encoded audio.
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(&self, text: &str) -> Result<Vec<u8>, RemoteError>;
}

pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, RemoteError>;
}
