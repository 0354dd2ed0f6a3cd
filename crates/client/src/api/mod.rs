//! Typed pass-through methods over the backend services.
//!
//! Nothing here owns business logic; each method forwards to a service
//! endpoint and normalizes the response shape for display.

pub mod images;
pub mod members;
pub mod posts;
pub mod timeline;

pub use images::UploadedImage;

use crate::error::ClientError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Unwrap a list from whichever envelope a service chose:
/// `data.content`, `content`, a bare array, or a `data` array.
pub(crate) fn listed_items<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, ClientError> {
    let node = if let Some(data) = value.get("data") {
        if let Some(content) = data.get("content") {
            content.clone()
        } else if data.is_array() {
            data.clone()
        } else {
            warn!("unexpected response structure, returning empty list");
            return Ok(Vec::new());
        }
    } else if let Some(content) = value.get("content") {
        content.clone()
    } else if value.is_array() {
        value
    } else {
        warn!("unexpected response structure, returning empty list");
        return Ok(Vec::new());
    };

    Ok(serde_json::from_value(node)?)
}
