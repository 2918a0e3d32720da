mod base_url;
mod error;
mod fetch;
mod http;
mod image;
mod llm;
mod retry;
mod speech;

pub use base_url::{check_base_url, openai_operation_url, OPENAI_DEFAULT_BASE_URL};
pub use error::AdapterError;
pub use fetch::HttpImageFetcher;
pub use http::InterfaceFormat;
pub use image::{ImageAdapter, MAX_IMAGE_ATTEMPTS};
pub use llm::ChatAdapter;
pub use retry::{call_with_retry, RetryConfig};
pub use speech::SpeechAdapter;

pub use story_core::config::{Config, ImageConfig, LlmConfig, SpeechConfig};
pub use story_core::{ImageFetcher, ImageGenerator, LanguageModel, RemoteError, SpeechSynthesizer};

pub fn create_llm_adapter(config: &LlmConfig) -> Result<Box<dyn LanguageModel>, AdapterError> {
    Ok(Box::new(ChatAdapter::new(config)?))
}

pub fn create_image_adapter(
    config: &ImageConfig,
) -> Result<Box<dyn ImageGenerator>, AdapterError> {
    Ok(Box::new(ImageAdapter::new(config)?))
}

pub fn create_speech_adapter(
    config: &SpeechConfig,
) -> Result<Box<dyn SpeechSynthesizer>, AdapterError> {
    Ok(Box::new(SpeechAdapter::new(config)?))
}

pub fn create_image_fetcher() -> Result<Box<dyn ImageFetcher>, AdapterError> {
    Ok(Box::new(HttpImageFetcher::new()?))
}

/// Every hosted collaborator the story pipeline can use, built from one config.
pub struct ServiceAdapters {
    pub text: Box<dyn LanguageModel>,
    pub image: Box<dyn ImageGenerator>,
    pub speech: Box<dyn SpeechSynthesizer>,
    pub fetcher: Box<dyn ImageFetcher>,
}

impl ServiceAdapters {
    /// Builds all adapters. Missing credentials are not an error here; the
    /// affected service reports itself as not configured when called.
    pub fn from_config(config: &Config) -> Result<Self, AdapterError> {
        Ok(Self {
            text: create_llm_adapter(&config.text)?,
            image: create_image_adapter(&config.image)?,
            speech: create_speech_adapter(&config.speech)?,
            fetcher: create_image_fetcher()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_interface_format_is_rejected() {
        let mut config = Config::default();
        config.image.interface_format = "stable diffusion".into();
        assert!(matches!(
            ServiceAdapters::from_config(&config),
            Err(AdapterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn default_config_builds_unconfigured_adapters() {
        let adapters = ServiceAdapters::from_config(&Config::default()).unwrap();
        assert!(adapters.text.invoke("hi", 5).unwrap_err().is_not_configured());
        assert!(adapters.image.generate_image("hi").unwrap_err().is_not_configured());
        assert!(adapters.speech.synthesize("hi").unwrap_err().is_not_configured());
    }
}
