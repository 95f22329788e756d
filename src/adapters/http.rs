use crate::domain::model::SubrequestResponse;
use crate::domain::ports::SubrequestClient;
use crate::utils::error::{AggregatorError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::HashMap;
use url::Url;

/// Subrequest client that resolves paths against one upstream base URL.
#[derive(Debug, Clone)]
pub struct HttpSubrequestClient {
    client: Client,
    base_url: Url,
    headers: HeaderMap,
}

impl HttpSubrequestClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_headers(base_url, &HashMap::new())
    }

    pub fn with_headers(base_url: &str, headers: &HashMap<String, String>) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| AggregatorError::InvalidConfigValueError {
            field: "upstream_url".to_string(),
            value: base_url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                AggregatorError::InvalidConfigValueError {
                    field: "upstream.headers".to_string(),
                    value: name.clone(),
                    reason: e.to_string(),
                }
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                AggregatorError::InvalidConfigValueError {
                    field: format!("upstream.headers.{}", name),
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
            header_map.insert(header_name, header_value);
        }

        Ok(Self {
            client: Client::new(),
            base_url,
            headers: header_map,
        })
    }

    fn resolve(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AggregatorError::ConfigError {
                message: format!("Cannot resolve subrequest path '{}': {}", path, e),
            })
    }
}

#[async_trait]
impl SubrequestClient for HttpSubrequestClient {
    async fn fetch(&self, path: &str) -> Result<SubrequestResponse> {
        let url = self.resolve(path)?;
        tracing::debug!("📡 Subrequest GET {}", url);

        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!("📡 Subrequest {} -> {} ({} bytes)", path, status, body.len());

        Ok(SubrequestResponse { status, body })
    }
}
