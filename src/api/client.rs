use std::future::Future;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::envelope::ApiEnvelope;
use super::error::ApiError;
use crate::config::Config;

/// Source of listing data, called on cache misses
pub trait DataSource: Send + Sync {
    fn fetch(
        &self,
        path: &str,
        params: &Map<String, Value>,
    ) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

/// REST backend client
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
}

impl RestClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()?;

        info!("Initializing REST client for {}", config.api_base_url);

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl DataSource for RestClient {
    async fn fetch(&self, path: &str, params: &Map<String, Value>) -> Result<Value, ApiError> {
        let url = self.url(path);
        let query = query_pairs(params);
        debug!("GET {} with {:?}", url, query);

        let response = self.http.get(&url).query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        let envelope: ApiEnvelope<Value> = response.json().await?;
        envelope.into_result()
    }
}

// Unset filters are left off the query string entirely.
fn query_pairs(params: &Map<String, Value>) -> Vec<(&str, String)> {
    params
        .iter()
        .filter_map(|(name, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((name.as_str(), s.clone())),
            other => Some((name.as_str(), other.to_string())),
        })
        .collect()
}
