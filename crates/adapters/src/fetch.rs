use log::warn;
use reqwest::blocking::Client;

use story_core::{ImageFetcher, RemoteError};

use crate::error::AdapterError;
use crate::http::{build_client, ensure_success};

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

/// Plain unauthenticated GET used to download generated images.
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new() -> Result<Self, AdapterError> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self, AdapterError> {
        Ok(Self {
            client: build_client(timeout_secs)?,
        })
    }

    fn fetch_once(&self, url: &str) -> Result<Vec<u8>, AdapterError> {
        let response = ensure_success(self.client.get(url).send()?)?;
        let bytes = response.bytes()?;
        if bytes.is_empty() {
            return Err(AdapterError::EmptyResponse);
        }
        Ok(bytes.to_vec())
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        self.fetch_once(url).map_err(|err| {
            warn!("image download from {} failed: {}", url, err);
            RemoteError::from(err)
        })
    }
}
