use log::warn;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use story_core::config::LlmConfig;
use story_core::{LanguageModel, RemoteError};

use crate::error::AdapterError;
use crate::http::{build_client, ensure_success, InterfaceFormat, ServiceEndpoint};

const CHAT_COMPLETIONS: &str = "chat/completions";

/// Chat-completions client for Azure OpenAI deployments and OpenAI-compatible APIs.
pub struct ChatAdapter {
    client: Client,
    endpoint: ServiceEndpoint,
    model_name: String,
    temperature: f32,
    top_p: f32,
}

impl ChatAdapter {
    pub fn new(config: &LlmConfig) -> Result<Self, AdapterError> {
        let endpoint = ServiceEndpoint::resolve(
            "text",
            &config.interface_format,
            &config.base_url,
            &config.api_key,
            CHAT_COMPLETIONS,
        )?;

        if endpoint.format() == InterfaceFormat::OpenAi && config.model_name.trim().is_empty() {
            return Err(AdapterError::InvalidConfig(
                "model_name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            client: build_client(config.timeout)?,
            endpoint,
            model_name: config.model_name.trim().to_string(),
            temperature: config.temperature,
            top_p: config.top_p,
        })
    }

    pub fn endpoint_url(&self) -> &str {
        self.endpoint.url()
    }

    fn invoke_once(&self, prompt: &str, max_tokens: u32) -> Result<String, AdapterError> {
        // Azure selects the model through the deployment in the URL.
        let model = match self.endpoint.format() {
            InterfaceFormat::OpenAi => Some(self.model_name.as_str()),
            InterfaceFormat::AzureOpenAi => None,
        };

        let body = ChatCompletionRequest {
            model,
            messages: vec![ChatMessageRequest {
                role: "user",
                content: prompt,
            }],
            max_tokens: if max_tokens == 0 {
                None
            } else {
                Some(max_tokens)
            },
            temperature: self.temperature,
            top_p: self.top_p,
        };

        let response = self.endpoint.post(&self.client)?.json(&body).send()?;
        handle_chat_response(response)
    }
}

impl LanguageModel for ChatAdapter {
    fn invoke(&self, prompt: &str, max_tokens: u32) -> Result<String, RemoteError> {
        self.invoke_once(prompt, max_tokens).map_err(|err| {
            if !err.is_missing_credentials() {
                warn!("chat completion failed: {}", err);
            }
            RemoteError::from(err)
        })
    }
}

fn handle_chat_response(response: reqwest::blocking::Response) -> Result<String, AdapterError> {
    let parsed: ChatCompletionResponse = ensure_success(response)?.json()?;
    extract_choice_content(parsed).ok_or(AdapterError::EmptyResponse)
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<ChatMessageRequest<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    temperature: f32,
    top_p: f32,
}

#[derive(Serialize)]
struct ChatMessageRequest<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatMessage>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

fn extract_choice_content(response: ChatCompletionResponse) -> Option<String> {
    response.choices.into_iter().find_map(|choice| {
        choice
            .message
            .and_then(|message| message.content)
            .or(choice.text)
            .filter(|content| !content.trim().is_empty())
    })
}
