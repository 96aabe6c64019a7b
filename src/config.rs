//! Resource limits for [`JSONPathEngine`](crate::JSONPathEngine).
//!
//! A `Config` can be built in code, taken from one of the presets, or read
//! from JSON. Fields missing from the JSON take their default values.
//!
//! ```
//! use jsonpath_plus::Config;
//!
//! let config = Config::from_json(r#"{"max_result_count": 10}"#).unwrap();
//! assert_eq!(config.max_result_count, 10);
//! assert_eq!(config.max_recursion_depth, 100);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::JSONPathError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Longest path, in bytes, the engine will compile.
    pub max_path_length: usize,
    /// Deepest nesting of recursive descent and nested filters.
    pub max_recursion_depth: usize,
    /// Results beyond this count are dropped.
    pub max_result_count: usize,
    pub timeout_ms: u64,
    /// Number of compiled paths to keep. Zero disables caching.
    pub cache_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_path_length: 1000,
            max_recursion_depth: 100,
            max_result_count: 10_000,
            timeout_ms: 30_000,
            cache_size: 100,
        }
    }
}

impl Config {
    /// Tighter limits for untrusted paths.
    pub fn production() -> Self {
        Self {
            max_path_length: 500,
            max_recursion_depth: 50,
            max_result_count: 1000,
            timeout_ms: 5000,
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self, JSONPathError> {
        let config: Config = serde_json::from_str(text)
            .map_err(|err| JSONPathError::config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), JSONPathError> {
        let positive = [
            ("max_path_length", self.max_path_length),
            ("max_recursion_depth", self.max_recursion_depth),
            ("max_result_count", self.max_result_count),
        ];

        for (field, value) in positive {
            if value == 0 {
                return Err(JSONPathError::config(format!(
                    "{} must be greater than 0",
                    field
                )));
            }
        }

        if self.timeout_ms == 0 {
            return Err(JSONPathError::config(String::from(
                "timeout_ms must be greater than 0",
            )));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
