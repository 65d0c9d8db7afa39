use crate::api::traits::ApiTransport;
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

/// reqwest-backed transport for the listings API
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(config: &Config) -> ApiResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("aqaar-listings/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ApiTransport for HttpClient {
    async fn get_json(&self, path: &str, query: &[(String, String)]) -> ApiResult<Value> {
        let url = self.url_for(path);
        debug!(%url, ?query, "GET");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => {
                let body = response.json::<Value>().await?;
                Ok(body)
            }
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(url)),
            s => {
                warn!("{} returned status: {}", url, s);
                Err(ApiError::Http {
                    status: s.as_u16(),
                    url,
                })
            }
        }
    }

    fn source_name(&self) -> &'static str {
        "aqaar"
    }
}
