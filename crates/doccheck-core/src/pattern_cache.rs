/// Thread-safe cache for compiled regex patterns plus the rule-pattern
/// registry loaded from configuration.
///
/// Each distinct pattern string compiles to exactly one shared `Arc<Regex>`;
/// the check-then-insert is guarded by a single mutex so concurrent callers
/// never double-compile or observe partial state. The registry holds two
/// namespaces ("required_language", "boilerplate") of per-document-type
/// pattern lists, all of which are compiled eagerly at load time. A
/// malformed registry file is a fatal startup error, not a per-call one.
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::CoreError;

const REGISTRY_NAMESPACES: [&str; 2] = ["required_language", "boilerplate"];

#[derive(Debug, Default)]
pub struct PatternCache {
    cache: Mutex<HashMap<String, Arc<Regex>>>,
    /// namespace -> document type -> pattern strings. Immutable after load.
    registry: HashMap<String, HashMap<String, Vec<String>>>,
}

impl PatternCache {
    /// An empty cache with no pattern registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the pattern registry from a JSON file and warm the cache for
    /// every pattern found. The namespaces may sit at the top level or be
    /// nested under a `patterns` key.
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let display_path = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::PatternConfig {
            path: display_path.clone(),
            message: e.to_string(),
        })?;
        let data: Value =
            serde_json::from_str(&content).map_err(|e| CoreError::PatternConfig {
                path: display_path.clone(),
                message: e.to_string(),
            })?;

        let cache = Self::from_value(&data, &display_path)?;
        debug!(path = %display_path, "pattern registry loaded");
        Ok(cache)
    }

    /// Build a cache from already-parsed registry data. Exposed for tests.
    pub fn from_value(data: &Value, origin: &str) -> Result<Self, CoreError> {
        let mut registry: HashMap<String, HashMap<String, Vec<String>>> = HashMap::new();

        for namespace in REGISTRY_NAMESPACES {
            let section = data
                .get(namespace)
                .or_else(|| data.get("patterns").and_then(|p| p.get(namespace)));
            let Some(section) = section else {
                continue;
            };
            let entries = section
                .as_object()
                .ok_or_else(|| CoreError::PatternConfig {
                    path: origin.to_string(),
                    message: format!("'{namespace}' must map document types to pattern lists"),
                })?;

            let mut by_doc_type = HashMap::new();
            for (doc_type, patterns) in entries {
                let patterns = patterns
                    .as_array()
                    .ok_or_else(|| CoreError::PatternConfig {
                        path: origin.to_string(),
                        message: format!("'{namespace}.{doc_type}' must be a list of patterns"),
                    })?
                    .iter()
                    .map(|p| {
                        p.as_str().map(str::to_string).ok_or_else(|| {
                            CoreError::PatternConfig {
                                path: origin.to_string(),
                                message: format!(
                                    "'{namespace}.{doc_type}' contains a non-string pattern"
                                ),
                            }
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                by_doc_type.insert(doc_type.clone(), patterns);
            }
            registry.insert(namespace.to_string(), by_doc_type);
        }

        let cache = Self {
            cache: Mutex::new(HashMap::new()),
            registry,
        };

        // Eagerly compile everything so bad patterns surface at startup.
        for by_doc_type in cache.registry.values() {
            for patterns in by_doc_type.values() {
                for pattern in patterns {
                    cache.get(pattern)?;
                }
            }
        }
        Ok(cache)
    }

    /// Get a compiled pattern, compiling and caching it on first request.
    pub fn get(&self, pattern: &str) -> Result<Arc<Regex>, CoreError> {
        let mut cache = self.cache.lock().expect("pattern cache lock poisoned");
        if let Some(compiled) = cache.get(pattern) {
            return Ok(Arc::clone(compiled));
        }
        let compiled = Regex::new(pattern).map_err(|e| CoreError::InvalidPattern {
            pattern: pattern.to_string(),
            source: e,
        })?;
        let compiled = Arc::new(compiled);
        cache.insert(pattern.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Compiled required-language patterns for a document type. Empty when
    /// the registry has no entry for the type.
    pub fn required_language_patterns(
        &self,
        doc_type: &str,
    ) -> Result<Vec<Arc<Regex>>, CoreError> {
        self.namespace_patterns("required_language", doc_type)
    }

    /// Compiled boilerplate patterns for a document type.
    pub fn boilerplate_patterns(&self, doc_type: &str) -> Result<Vec<Arc<Regex>>, CoreError> {
        self.namespace_patterns("boilerplate", doc_type)
    }

    /// Raw pattern strings for a namespace/document type pair.
    pub fn registry_patterns(&self, namespace: &str, doc_type: &str) -> &[String] {
        self.registry
            .get(namespace)
            .and_then(|by_type| by_type.get(doc_type))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn namespace_patterns(
        &self,
        namespace: &str,
        doc_type: &str,
    ) -> Result<Vec<Arc<Regex>>, CoreError> {
        self.registry_patterns(namespace, doc_type)
            .iter()
            .map(|p| self.get(p))
            .collect()
    }

    /// Drop all compiled patterns. Test isolation only; the registry itself
    /// is untouched and patterns recompile on demand.
    pub fn clear(&self) {
        self.cache.lock().expect("pattern cache lock poisoned").clear();
    }

    #[cfg(test)]
    fn cached_len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}
