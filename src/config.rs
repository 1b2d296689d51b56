// Configuration for:
// - REST backend location and client timeout
// - Cache capacity per query family
// - Listing TTLs per query family

use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::QueryFamily;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub api_timeout_secs: u64,
    pub cache_max_capacity: u64,
    pub affiliates_ttl: Duration,
    pub campaigns_ttl: Duration,
    pub coupons_ttl: Duration,
    pub network_ttl: Duration,
    pub brand_finances_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/api".to_string(),
            api_timeout_secs: 30,
            cache_max_capacity: 1000,
            affiliates_ttl: Duration::from_secs(5 * 60),
            campaigns_ttl: Duration::from_secs(5 * 60),
            coupons_ttl: Duration::from_secs(2 * 60),
            network_ttl: Duration::from_secs(3 * 60),
            brand_finances_ttl: Duration::from_secs(2 * 60),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Self::default();

        let api_base_url = env::var("API_BASE_URL").unwrap_or(defaults.api_base_url);
        let api_timeout_secs = env_or("API_TIMEOUT_SECS", defaults.api_timeout_secs);
        let cache_max_capacity = env_or("CACHE_MAX_CAPACITY", defaults.cache_max_capacity);

        Self {
            api_base_url,
            api_timeout_secs,
            cache_max_capacity,
            affiliates_ttl: env_millis("AFFILIATES_CACHE_TTL_MS", defaults.affiliates_ttl),
            campaigns_ttl: env_millis("CAMPAIGNS_CACHE_TTL_MS", defaults.campaigns_ttl),
            coupons_ttl: env_millis("COUPONS_CACHE_TTL_MS", defaults.coupons_ttl),
            network_ttl: env_millis("NETWORK_CACHE_TTL_MS", defaults.network_ttl),
            brand_finances_ttl: env_millis("BRAND_FINANCES_CACHE_TTL_MS", defaults.brand_finances_ttl),
        }
    }

    pub fn ttl_for(&self, family: QueryFamily) -> Duration {
        match family {
            QueryFamily::Affiliates => self.affiliates_ttl,
            QueryFamily::Campaigns => self.campaigns_ttl,
            QueryFamily::Coupons => self.coupons_ttl,
            QueryFamily::Network => self.network_ttl,
            QueryFamily::BrandFinances => self.brand_finances_ttl,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_millis(name: &str, default: Duration) -> Duration {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}
