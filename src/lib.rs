//! Query cache and fee resolution core for the affiliate operations dashboard.
//!
//! - [`cache`]: per-family query caches with TTL expiry and invalidation
//! - [`fees`]: first-match-wins withdrawal tax and commission calculation
//! - [`state`]: the cache-then-fetch flow over the REST backend

pub mod api;
pub mod cache;
pub mod config;
pub mod fees;
pub mod state;
pub mod validation;

#[cfg(test)]
mod tests;

pub use api::error::ApiError;
pub use cache::{AppCache, CacheKey, QueryCache, QueryFamily};
pub use fees::{net_after_charge, resolve, Charge, FeeRule, FeeRuleSet, NetAmount, Operator};
pub use state::{AppState, QueryError};
pub use validation::ValidationError;
