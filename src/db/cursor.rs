use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Opaque pagination token. Callers only round-trip it; the store is the
/// only place that looks inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoreKey {
    pub creator_id: String,
    pub submitted_at: String,
}

impl Cursor {
    pub fn from_token(token: Option<String>) -> Option<Self> {
        token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(Cursor)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn encode(key: &StoreKey) -> Result<Self, AppError> {
        let json = serde_json::to_vec(key).map_err(|e| AppError::Serialization(e.to_string()))?;
        Ok(Cursor(URL_SAFE_NO_PAD.encode(json)))
    }

    pub(crate) fn decode(&self) -> Result<StoreKey, AppError> {
        let invalid = || AppError::BadRequest("Invalid cursor".into());
        let bytes = URL_SAFE_NO_PAD.decode(self.0.as_bytes()).map_err(|_| invalid())?;
        serde_json::from_slice(&bytes).map_err(|_| invalid())
    }
}
