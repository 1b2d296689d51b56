pub mod client;
pub mod envelope;
pub mod error;

pub use client::{DataSource, RestClient};
pub use envelope::ApiEnvelope;
pub use error::ApiError;
