//! A query front end that applies configured limits.

use std::{sync::Arc, time::Instant};

use log::{debug, warn};
use serde_json::Value;

use crate::{
    cache::{CacheStats, QueryCache},
    config::Config,
    env::Environment,
    errors::JSONPathError,
    node::Match,
    position::locate,
    Query,
};

/// Compiles paths through a cache and evaluates them within the limits of a
/// [`Config`].
pub struct JSONPathEngine {
    config: Config,
    env: Environment,
    cache: QueryCache,
}

impl JSONPathEngine {
    pub fn new(config: Config) -> Result<Self, JSONPathError> {
        config.validate()?;
        Ok(Self {
            env: Environment::new().with_max_recursion_depth(config.max_recursion_depth),
            cache: QueryCache::new(config.cache_size),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn compile(&self, path: &str) -> Result<Arc<Query>, JSONPathError> {
        if path.len() > self.config.max_path_length {
            warn!(
                "path of {} bytes exceeds the limit of {}",
                path.len(),
                self.config.max_path_length
            );
            return Err(JSONPathError::limit(format!(
                "path length {} exceeds maximum of {}",
                path.len(),
                self.config.max_path_length
            )));
        }
        self.cache.get_or_compile(path)
    }

    /// Decode `text` and evaluate `path` against it. Matches carry their
    /// position in `text`.
    pub fn query(&self, path: &str, text: &str) -> Result<Vec<Match>, JSONPathError> {
        let value: Value = serde_json::from_str(text)?;
        self.evaluate(path, &value, Some(text))
    }

    pub fn query_value(&self, path: &str, value: &Value) -> Result<Vec<Match>, JSONPathError> {
        self.evaluate(path, value, None)
    }

    fn evaluate(
        &self,
        path: &str,
        value: &Value,
        text: Option<&str>,
    ) -> Result<Vec<Match>, JSONPathError> {
        let query = self.compile(path)?;
        let started = Instant::now();
        let deadline = started + self.config.timeout();

        let nodes = query
            .find_with_checkpoint(value, &self.env, || Instant::now() < deadline)
            .map_err(|err| {
                debug!("{} failed: {}", path, err);
                err
            })?;

        if nodes.len() > self.config.max_result_count {
            warn!(
                "{} matched {} values, keeping the first {}",
                path,
                nodes.len(),
                self.config.max_result_count
            );
        }

        let matches: Vec<Match> = nodes
            .iter()
            .take(self.config.max_result_count)
            .map(|node| {
                let mut m = Match::from(node);
                if let Some(text) = text {
                    m.position = locate(node, text);
                }
                m
            })
            .collect();

        debug!(
            "{} matched {} value(s) in {:?}",
            path,
            matches.len(),
            started.elapsed()
        );

        Ok(matches)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
