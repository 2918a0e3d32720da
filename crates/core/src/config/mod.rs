use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SECRET_TEXT_ENDPOINT: &str = "AZURE_OPENAI_API_ENDPOINT";
pub const SECRET_API_KEY: &str = "AZURE_OPENAI_API_KEY";
pub const SECRET_IMAGE_ENDPOINT: &str = "DALLE_API_ENDPOINT";
pub const SECRET_SPEECH_ENDPOINT: &str = "AZURE_TTS_ENDPOINT";

const SECRET_KEYS: [&str; 4] = [
    SECRET_TEXT_ENDPOINT,
    SECRET_API_KEY,
    SECRET_IMAGE_ENDPOINT,
    SECRET_SPEECH_ENDPOINT,
];

fn default_interface_format() -> String {
    "azure openai".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    1.0
}

fn default_timeout() -> u64 {
    600
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

fn default_image_attempts() -> usize {
    2
}

fn default_image_retry_delay_ms() -> u64 {
    1_000
}

fn default_speech_model() -> String {
    "tts-1".to_string()
}

fn default_voice() -> String {
    "alloy".to_string()
}

fn default_response_format() -> String {
    "mp3".to_string()
}

fn default_speed() -> f32 {
    1.0
}

fn default_stories_dir() -> PathBuf {
    PathBuf::from("output_stories")
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("output_audio")
}

fn default_story_template() -> String {
    "story".to_string()
}

fn credentials_present(api_key: &str, base_url: &str) -> bool {
    !api_key.trim().is_empty() && !base_url.trim().is_empty()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to parse TOML config: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("failed to serialize TOML config: {0}")]
    SerializeToml(#[from] toml::ser::Error),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_interface_format")]
    pub interface_format: String,
    #[serde(default)]
    pub model_name: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: String::new(),
            interface_format: default_interface_format(),
            model_name: String::new(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            timeout: default_timeout(),
        }
    }
}

impl LlmConfig {
    pub fn is_configured(&self) -> bool {
        credentials_present(&self.api_key, &self.base_url)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ImageConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_interface_format")]
    pub interface_format: String,
    #[serde(default = "default_image_model")]
    pub model_name: String,
    #[serde(default = "default_image_size")]
    pub size: String,
    #[serde(default = "default_image_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_image_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: String::new(),
            interface_format: default_interface_format(),
            model_name: default_image_model(),
            size: default_image_size(),
            max_attempts: default_image_attempts(),
            retry_delay_ms: default_image_retry_delay_ms(),
            timeout: default_timeout(),
        }
    }
}

impl ImageConfig {
    pub fn is_configured(&self) -> bool {
        credentials_present(&self.api_key, &self.base_url)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SpeechConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_interface_format")]
    pub interface_format: String,
    #[serde(default = "default_speech_model")]
    pub model_name: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_response_format")]
    pub response_format: String,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: String::new(),
            interface_format: default_interface_format(),
            model_name: default_speech_model(),
            voice: default_voice(),
            response_format: default_response_format(),
            speed: default_speed(),
            timeout: default_timeout(),
        }
    }
}

impl SpeechConfig {
    pub fn is_configured(&self) -> bool {
        credentials_present(&self.api_key, &self.base_url)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_stories_dir")]
    pub stories_dir: PathBuf,
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            stories_dir: default_stories_dir(),
            audio_dir: default_audio_dir(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PromptConfig {
    #[serde(default)]
    pub custom_directories: Vec<PathBuf>,
    /// Registry key of the prompt used for the story body.
    #[serde(default = "default_story_template")]
    pub story_template: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            custom_directories: Vec::new(),
            story_template: default_story_template(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub text: LlmConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub prompts: PromptConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }

        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }

        let value: Value = toml::from_str(input)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        if SECRET_KEYS.iter().any(|key| value.get(key).is_some()) {
            let mut config = Self::default();
            if let Value::Object(map) = value {
                config.apply_secrets(
                    map.into_iter()
                        .filter_map(|(key, value)| value.as_str().map(|v| (key, v.to_string()))),
                );
            }
            Ok(config)
        } else {
            Ok(serde_json::from_value(value)?)
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        if is_toml(path) {
            Self::from_toml_str(&data)
        } else {
            Self::from_json_str(&data)
        }
    }

    pub fn to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let serialized = if is_toml(path) {
            toml::to_string_pretty(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        fs::write(path, serialized)?;
        Ok(())
    }

    /// Overlays flat secret entries. Unknown keys and blank values are ignored.
    /// The shared API key only fills services that have no key of their own.
    pub fn apply_secrets<I, K, V>(&mut self, secrets: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in secrets {
            let value: String = value.into();
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                SECRET_TEXT_ENDPOINT => self.text.base_url = value.to_string(),
                SECRET_IMAGE_ENDPOINT => self.image.base_url = value.to_string(),
                SECRET_SPEECH_ENDPOINT => self.speech.base_url = value.to_string(),
                SECRET_API_KEY => {
                    self.text.api_key = value.to_string();
                    if self.image.api_key.trim().is_empty() {
                        self.image.api_key = value.to_string();
                    }
                    if self.speech.api_key.trim().is_empty() {
                        self.speech.api_key = value.to_string();
                    }
                }
                _ => {}
            }
        }
    }

    pub fn apply_env(&mut self) {
        self.apply_secrets(std::env::vars().filter(|(key, _)| SECRET_KEYS.contains(&key.as_str())));
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false)
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
}

impl ConfigStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = if path.exists() {
            Config::from_path(&path)?
        } else {
            Config::default()
        };

        Ok(Self { path, config })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        Config::from_path(path.as_ref())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn reload(&mut self) -> Result<(), ConfigError> {
        if self.path.exists() {
            self.config = Config::from_path(&self.path)?;
        } else {
            self.config = Config::default();
        }
        Ok(())
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.config.to_path(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_modern_config() {
        let json = r#"{
            "text": {
                "api_key": "123",
                "base_url": "https://example.openai.azure.com/openai/deployments/gpt/chat/completions?api-version=2024-02-01",
                "temperature": 0.5
            },
            "image": {
                "api_key": "img",
                "base_url": "https://example.com/dalle",
                "max_attempts": 1
            },
            "output": { "stories_dir": "out/stories" },
            "prompts": { "story_template": "story_exact" }
        }"#;

        let config = Config::from_json_str(json).unwrap();
        assert!(config.text.is_configured());
        assert_eq!(config.text.interface_format, "azure openai");
        assert_eq!(config.text.temperature, 0.5);
        assert_eq!(config.text.top_p, 1.0);
        assert_eq!(config.image.max_attempts, 1);
        assert_eq!(config.image.size, "1024x1024");
        assert!(!config.speech.is_configured());
        assert_eq!(config.speech.voice, "alloy");
        assert_eq!(config.output.stories_dir, PathBuf::from("out/stories"));
        assert_eq!(config.output.audio_dir, PathBuf::from("output_audio"));
        assert_eq!(config.prompts.story_template, "story_exact");
    }

    #[test]
    fn parses_flat_secrets_toml() {
        let toml = r#"
            AZURE_OPENAI_API_ENDPOINT = "https://text.example.com/chat"
            AZURE_OPENAI_API_KEY = "shared"
            DALLE_API_ENDPOINT = "https://image.example.com/generate"
        "#;

        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.text.base_url, "https://text.example.com/chat");
        assert_eq!(config.text.api_key, "shared");
        assert_eq!(config.image.api_key, "shared");
        assert!(config.image.is_configured());
        assert_eq!(config.speech.api_key, "shared");
        assert!(!config.speech.is_configured());
    }

    #[test]
    fn secrets_keep_service_specific_keys() {
        let mut config = Config::default();
        config.speech.api_key = "speech-only".into();
        config.apply_secrets([
            (SECRET_API_KEY, "shared"),
            (SECRET_SPEECH_ENDPOINT, "  "),
            ("UNRELATED", "ignored"),
        ]);

        assert_eq!(config.speech.api_key, "speech-only");
        assert_eq!(config.image.api_key, "shared");
        assert!(config.speech.base_url.is_empty());
    }

    #[test]
    fn blank_credentials_are_not_configured() {
        let config = LlmConfig {
            api_key: "   ".into(),
            base_url: "https://example.com".into(),
            ..LlmConfig::default()
        };
        assert!(!config.is_configured());
    }

    #[test]
    fn env_secrets_fill_endpoints_and_shared_key() {
        std::env::set_var(SECRET_API_KEY, " env-shared ");
        std::env::set_var(SECRET_IMAGE_ENDPOINT, "https://image.env.example.com/generate");

        let mut config = Config::default();
        config.speech.api_key = "speech-own".into();
        config.apply_env();

        std::env::remove_var(SECRET_API_KEY);
        std::env::remove_var(SECRET_IMAGE_ENDPOINT);

        assert_eq!(config.text.api_key, "env-shared");
        assert_eq!(config.image.api_key, "env-shared");
        assert_eq!(config.speech.api_key, "speech-own");
        assert_eq!(config.image.base_url, "https://image.env.example.com/generate");
        assert!(config.image.is_configured());
    }

    #[test]
    fn store_persists_config_as_json_and_toml() {
        let temp = tempdir().unwrap();

        for name in ["config.json", "nested/config.toml"] {
            let path = temp.path().join(name);
            let mut store = ConfigStore::open(path.clone()).unwrap();
            store.config_mut().speech.base_url = "https://tts.example.com".into();
            store.config_mut().speech.api_key = "k".into();
            store.save().unwrap();

            let store = ConfigStore::open(path).unwrap();
            assert!(store.config().speech.is_configured());
            assert_eq!(store.config().speech.response_format, "mp3");
        }
    }

    #[test]
    fn reload_falls_back_to_defaults_when_file_missing() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.json");
        let mut store = ConfigStore::open(path.clone()).unwrap();
        store.config_mut().text.model_name = "gpt-4o".into();
        store.reload().unwrap();
        assert_eq!(store.config(), &Config::default());
        assert_eq!(store.path(), path.as_path());
    }
}
