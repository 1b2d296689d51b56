pub mod clock;
pub mod keys;
pub mod query;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-helpers"))]
pub use clock::MockClock;
pub use keys::{derive_key, derive_key_with_fields, CacheKey, KeyParams, MISSING_PARAM_PLACEHOLDER};
pub use query::{QueryCache, QueryCacheBuilder};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

use crate::config::Config;

/// Cached listing payloads, shared cheaply between readers
pub type Payload = Arc<Value>;

/// The dashboard's cached query families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryFamily {
    Affiliates,
    Campaigns,
    Coupons,
    Network,
    BrandFinances,
}

impl QueryFamily {
    pub const ALL: [QueryFamily; 5] = [
        QueryFamily::Affiliates,
        QueryFamily::Campaigns,
        QueryFamily::Coupons,
        QueryFamily::Network,
        QueryFamily::BrandFinances,
    ];

    pub fn namespace(self) -> &'static str {
        match self {
            Self::Affiliates => "affiliates-list",
            Self::Campaigns => "campaigns-list",
            Self::Coupons => "coupons-list",
            Self::Network => "network-list",
            Self::BrandFinances => "brand-finances",
        }
    }

    /// Filter fields every key of this family carries
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Affiliates => &["page", "perpage", "name", "status"],
            Self::Campaigns => &["page", "perpage", "name", "status"],
            Self::Coupons => &["page", "perpage", "code", "campaign_id"],
            Self::Network => &["page", "perpage", "search"],
            Self::BrandFinances => &["brand_id", "from", "to"],
        }
    }
}

impl fmt::Display for QueryFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}

impl FromStr for QueryFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "affiliates" | "affiliates-list" => Ok(Self::Affiliates),
            "campaigns" | "campaigns-list" => Ok(Self::Campaigns),
            "coupons" | "coupons-list" => Ok(Self::Coupons),
            "network" | "network-list" => Ok(Self::Network),
            "brand-finances" => Ok(Self::BrandFinances),
            other => Err(format!("unknown query family: {}", other)),
        }
    }
}

/// One cache per query family
#[derive(Clone, Debug)]
pub struct AppCache {
    pub affiliates: QueryCache<Payload>,
    pub campaigns: QueryCache<Payload>,
    pub coupons: QueryCache<Payload>,
    pub network: QueryCache<Payload>,
    pub brand_finances: QueryCache<Payload>,
}

impl AppCache {
    pub fn new(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let build = |family: QueryFamily| {
            QueryCache::builder(family.namespace(), config.ttl_for(family))
                .fields(family.fields())
                .max_capacity(config.cache_max_capacity)
                .clock(clock.clone())
                .build()
        };

        Self {
            affiliates: build(QueryFamily::Affiliates),
            campaigns: build(QueryFamily::Campaigns),
            coupons: build(QueryFamily::Coupons),
            network: build(QueryFamily::Network),
            brand_finances: build(QueryFamily::BrandFinances),
        }
    }

    pub fn family(&self, family: QueryFamily) -> &QueryCache<Payload> {
        match family {
            QueryFamily::Affiliates => &self.affiliates,
            QueryFamily::Campaigns => &self.campaigns,
            QueryFamily::Coupons => &self.coupons,
            QueryFamily::Network => &self.network,
            QueryFamily::BrandFinances => &self.brand_finances,
        }
    }

    /// Clear every family, e.g. on logout
    pub fn invalidate_all(&self) {
        for family in QueryFamily::ALL {
            self.family(family).invalidate_all();
        }
    }
}

pub fn init_cache(config: &Config) -> AppCache {
    AppCache::new(config, Arc::new(SystemClock))
}
