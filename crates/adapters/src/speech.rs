use log::warn;
use reqwest::blocking::Client;
use serde::Serialize;

use story_core::config::SpeechConfig;
use story_core::{RemoteError, SpeechSynthesizer};

use crate::error::AdapterError;
use crate::http::{build_client, ensure_success, ServiceEndpoint};

const AUDIO_SPEECH: &str = "audio/speech";

/// Text-to-speech client returning the raw encoded audio.
pub struct SpeechAdapter {
    client: Client,
    endpoint: ServiceEndpoint,
    model_name: String,
    voice: String,
    response_format: String,
    speed: f32,
}

impl SpeechAdapter {
    pub fn new(config: &SpeechConfig) -> Result<Self, AdapterError> {
        let endpoint = ServiceEndpoint::resolve(
            "speech",
            &config.interface_format,
            &config.base_url,
            &config.api_key,
            AUDIO_SPEECH,
        )?;

        if !(0.25_f32..=4.0).contains(&config.speed) {
            return Err(AdapterError::InvalidConfig(format!(
                "speech speed must be between 0.25 and 4.0, got {}",
                config.speed
            )));
        }

        Ok(Self {
            client: build_client(config.timeout)?,
            endpoint,
            model_name: config.model_name.clone(),
            voice: config.voice.clone(),
            response_format: config.response_format.clone(),
            speed: config.speed,
        })
    }

    pub fn endpoint_url(&self) -> &str {
        self.endpoint.url()
    }

    pub fn response_format(&self) -> &str {
        &self.response_format
    }

    fn synthesize_once(&self, text: &str) -> Result<Vec<u8>, AdapterError> {
        let body = SpeechRequest {
            model: &self.model_name,
            input: text,
            voice: &self.voice,
            response_format: &self.response_format,
            speed: self.speed,
        };
        let response = self.endpoint.post(&self.client)?.json(&body).send()?;
        let audio = ensure_success(response)?.bytes()?;
        if audio.is_empty() {
            return Err(AdapterError::EmptyResponse);
        }
        Ok(audio.to_vec())
    }
}

impl SpeechSynthesizer for SpeechAdapter {
    fn synthesize(&self, text: &str) -> Result<Vec<u8>, RemoteError> {
        self.synthesize_once(text).map_err(|err| {
            if !err.is_missing_credentials() {
                warn!("speech synthesis failed: {}", err);
            }
            RemoteError::from(err)
        })
    }
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
    speed: f32,
}
