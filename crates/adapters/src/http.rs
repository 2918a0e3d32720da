use std::time::Duration;

use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{self, HeaderValue};

use crate::base_url::openai_operation_url;
use crate::error::AdapterError;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InterfaceFormat {
    /// `api-key` header; the configured endpoint is the full request URL.
    AzureOpenAi,
    /// Bearer auth; the operation path is appended to a `/v1` base URL.
    OpenAi,
}

impl InterfaceFormat {
    pub fn parse(value: &str) -> Result<Self, AdapterError> {
        match value.trim().to_lowercase().as_str() {
            "" | "azure openai" | "azure" => Ok(Self::AzureOpenAi),
            "openai" => Ok(Self::OpenAi),
            other => Err(AdapterError::InvalidConfig(format!(
                "unknown interface_format: {}",
                other
            ))),
        }
    }
}

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, AdapterError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()?)
}

/// Resolved URL and credentials for one hosted operation.
#[derive(Clone, Debug)]
pub(crate) struct ServiceEndpoint {
    service: &'static str,
    format: InterfaceFormat,
    url: String,
    api_key: String,
}

impl ServiceEndpoint {
    pub fn resolve(
        service: &'static str,
        interface_format: &str,
        base_url: &str,
        api_key: &str,
        operation: &str,
    ) -> Result<Self, AdapterError> {
        let format = InterfaceFormat::parse(interface_format)?;
        let url = match format {
            InterfaceFormat::AzureOpenAi => base_url.trim().to_string(),
            InterfaceFormat::OpenAi => openai_operation_url(base_url, operation),
        };
        Ok(Self {
            service,
            format,
            url,
            api_key: api_key.trim().to_string(),
        })
    }

    pub fn format(&self) -> InterfaceFormat {
        self.format
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.url.is_empty()
    }

    /// Starts an authenticated JSON POST, or reports missing credentials
    /// without touching the network.
    pub fn post(&self, client: &Client) -> Result<RequestBuilder, AdapterError> {
        if !self.is_configured() {
            return Err(AdapterError::MissingCredentials {
                service: self.service,
            });
        }

        debug!("POST {} ({})", self.url, self.service);
        let request = client.post(&self.url).header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        Ok(match self.format {
            InterfaceFormat::AzureOpenAi => {
                let key = HeaderValue::from_str(&self.api_key).map_err(|err| {
                    AdapterError::InvalidConfig(format!("invalid api key header: {}", err))
                })?;
                request.header("api-key", key)
            }
            InterfaceFormat::OpenAi => request.bearer_auth(&self.api_key),
        })
    }
}

pub(crate) fn ensure_success(response: Response) -> Result<Response, AdapterError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().unwrap_or_default();
    Err(AdapterError::HttpStatus { status, body })
}
