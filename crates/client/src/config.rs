//! Backend service endpoint configuration

use crate::error::ClientError;
use serde::{Deserialize, Serialize};

/// Base URLs for the six backend services the client talks to.
///
/// Defaults match the development compose setup; deployments override them
/// through `DAILYFEED_`-prefixed environment variables or a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    pub member: String,
    pub content: String,
    pub timeline: String,
    pub activity: String,
    pub image: String,
    pub search: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            member: "http://localhost:8084".to_string(),
            content: "http://localhost:8081".to_string(),
            timeline: "http://localhost:8082".to_string(),
            activity: "http://localhost:8086".to_string(),
            image: "http://localhost:8085".to_string(),
            search: "http://localhost:8083".to_string(),
        }
    }
}

impl ServicesConfig {
    /// Point every service at a single base URL. Useful when everything sits
    /// behind one reverse proxy, and in tests against a single mock server.
    pub fn single_origin(base_url: impl Into<String>) -> Self {
        let base = base_url.into();
        let base = base.trim_end_matches('/').to_string();
        Self {
            member: base.clone(),
            content: base.clone(),
            timeline: base.clone(),
            activity: base.clone(),
            image: base.clone(),
            search: base,
        }
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ClientError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("DAILYFEED"))
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| ClientError::Configuration(e.to_string()))
    }

    /// Load configuration with defaults and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables cannot be parsed
    pub fn from_env() -> Result<Self, ClientError> {
        let defaults = Self::default();

        let settings = config::Config::builder()
            .set_default("member", defaults.member)
            .and_then(|b| b.set_default("content", defaults.content))
            .and_then(|b| b.set_default("timeline", defaults.timeline))
            .and_then(|b| b.set_default("activity", defaults.activity))
            .and_then(|b| b.set_default("image", defaults.image))
            .and_then(|b| b.set_default("search", defaults.search))
            .and_then(|b| Ok(b.add_source(config::Environment::with_prefix("DAILYFEED"))))
            .and_then(|b| b.build())
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| ClientError::Configuration(e.to_string()))
    }
}
