use serde::{Deserialize, Serialize};

use super::error::ApiError;

/// The `{success, message, data}` wrapper every backend response uses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn into_result(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.message.unwrap_or_else(|| "no message".to_string()),
            ));
        }

        self.data.ok_or(ApiError::MissingData)
    }
}
