//! Index configuration.
//!
//! Kept deliberately small and serializable so it can be loaded from JSON
//! (or TOML with the `toml` feature) alongside application settings.

use crate::codec::MAX_STEP;
use serde::de::Error;
use serde::{Deserialize, Serialize};

/// Configuration for a [`GeoSet`](crate::GeoSet).
///
/// # Example
///
/// ```rust
/// use georadix::Config;
///
/// let config = Config::default();
/// assert!(config.search_step.is_none());
///
/// let config: Config = Config::from_json(r#"{ "search_step": 12 }"#).unwrap();
/// assert_eq!(config.search_step, Some(12));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Fixed quantization step (1-26) for radius searches.
    ///
    /// `None` derives the step from the search radius, which is the right
    /// choice for almost every workload. Pinning a step is a tuning lever
    /// for indexes whose members cluster at a known density; coverage of
    /// the search disc is still verified per query, so a pinned step that
    /// is too fine for a given radius is coarsened automatically.
    #[serde(default)]
    pub search_step: Option<u8>,
}

impl Config {
    /// Create a configuration with a pinned search step.
    pub fn with_search_step(step: u8) -> Self {
        assert!(
            (1..=MAX_STEP).contains(&step),
            "Search step must be between 1 and {}",
            MAX_STEP
        );
        Self {
            search_step: Some(step),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(step) = self.search_step
            && !(1..=MAX_STEP).contains(&step)
        {
            return Err(format!("Search step must be between 1 and {}", MAX_STEP));
        }
        Ok(())
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from a TOML string (requires the `toml` feature).
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as a TOML string (requires the `toml` feature).
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
