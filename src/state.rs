use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use crate::api::{ApiError, DataSource, RestClient};
use crate::cache::{self, AppCache, Payload, QueryFamily};
use crate::config::Config;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Unexpected payload shape: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Backend endpoint serving each query family
pub fn endpoint(family: QueryFamily) -> &'static str {
    match family {
        QueryFamily::Affiliates => "/affiliates",
        QueryFamily::Campaigns => "/campaigns",
        QueryFamily::Coupons => "/coupons",
        QueryFamily::Network => "/network",
        QueryFamily::BrandFinances => "/brand/finances",
    }
}

pub struct AppState<S = RestClient> {
    pub config: Config,
    pub cache: AppCache,
    pub source: S,
}

impl AppState<RestClient> {
    pub fn from_config(config: Config) -> Result<Self, ApiError> {
        let source = RestClient::new(&config)?;
        let cache = cache::init_cache(&config);

        Ok(Self {
            config,
            cache,
            source,
        })
    }
}

impl<S: DataSource> AppState<S> {
    pub fn new(config: Config, cache: AppCache, source: S) -> Self {
        Self {
            config,
            cache,
            source,
        }
    }

    /// Serve a listing from cache, fetching it on a miss
    pub async fn query(&self, family: QueryFamily, params: &Map<String, Value>) -> Result<Payload, QueryError> {
        let cache = self.cache.family(family);
        let key = cache.key(params)?;

        let payload = cache
            .load(&key, move || async move {
                let data = self.source.fetch(endpoint(family), params).await?;
                Ok::<_, ApiError>(Arc::new(data))
            })
            .await?;

        Ok(payload)
    }

    pub async fn query_as<T: DeserializeOwned>(
        &self,
        family: QueryFamily,
        params: &Map<String, Value>,
    ) -> Result<T, QueryError> {
        let payload = self.query(family, params).await?;
        Ok(T::deserialize(&*payload)?)
    }

    /// Drop one cached listing and load it again
    pub async fn refetch(&self, family: QueryFamily, params: &Map<String, Value>) -> Result<Payload, QueryError> {
        let key = self.cache.family(family).key(params)?;
        self.cache.family(family).invalidate(&key).await;
        self.query(family, params).await
    }

    /// A write touched `family`; which cached pages it affected is unknown,
    /// so the whole family goes.
    pub fn record_mutation(&self, family: QueryFamily) {
        info!("Mutation recorded for {}, invalidating cached listings", family);
        self.cache.family(family).invalidate_all();
    }
}
