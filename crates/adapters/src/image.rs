use std::time::Duration;

use log::warn;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use story_core::config::ImageConfig;
use story_core::{ImageGenerator, RemoteError};

use crate::error::AdapterError;
use crate::http::{build_client, ensure_success, ServiceEndpoint};
use crate::retry::{call_with_retry, RetryConfig};

const IMAGE_GENERATIONS: &str = "images/generations";
/// One initial request plus a single retry.
pub const MAX_IMAGE_ATTEMPTS: usize = 2;

/// DALL·E style image generation returning a hosted image URL.
pub struct ImageAdapter {
    client: Client,
    endpoint: ServiceEndpoint,
    model_name: String,
    size: String,
    retry: RetryConfig,
}

impl ImageAdapter {
    pub fn new(config: &ImageConfig) -> Result<Self, AdapterError> {
        let endpoint = ServiceEndpoint::resolve(
            "image",
            &config.interface_format,
            &config.base_url,
            &config.api_key,
            IMAGE_GENERATIONS,
        )?;

        let max_attempts = config.max_attempts.clamp(1, MAX_IMAGE_ATTEMPTS);
        if max_attempts != config.max_attempts {
            warn!(
                "image max_attempts {} is outside 1..={}, using {}",
                config.max_attempts, MAX_IMAGE_ATTEMPTS, max_attempts
            );
        }

        Ok(Self {
            client: build_client(config.timeout)?,
            endpoint,
            model_name: config.model_name.clone(),
            size: config.size.clone(),
            retry: RetryConfig::new(max_attempts, Duration::from_millis(config.retry_delay_ms)),
        })
    }

    pub fn endpoint_url(&self) -> &str {
        self.endpoint.url()
    }

    pub fn max_attempts(&self) -> usize {
        self.retry.max_attempts
    }

    fn generate_once(&self, prompt: &str) -> Result<String, AdapterError> {
        let body = ImageGenerationRequest {
            prompt,
            model: &self.model_name,
            size: &self.size,
        };
        let response = self.endpoint.post(&self.client)?.json(&body).send()?;
        let parsed: ImageGenerationResponse = ensure_success(response)?.json()?;
        first_image_url(parsed).ok_or(AdapterError::EmptyResponse)
    }
}

impl ImageGenerator for ImageAdapter {
    fn generate_image(&self, prompt: &str) -> Result<String, RemoteError> {
        call_with_retry(|| self.generate_once(prompt), &self.retry).map_err(|err| {
            if !err.is_missing_credentials() {
                warn!("image generation failed: {}", err);
            }
            RemoteError::from(err)
        })
    }
}

#[derive(Serialize)]
struct ImageGenerationRequest<'a> {
    prompt: &'a str,
    model: &'a str,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
}

fn first_image_url(response: ImageGenerationResponse) -> Option<String> {
    response
        .data
        .into_iter()
        .next()
        .and_then(|data| data.url)
        .filter(|url| !url.trim().is_empty())
}
