//! Runtime configuration.
//!
//! Values come from serde (a config file or JSON from the bindings) or from
//! the environment via [`SizefitConfig::from_env`]; command-line flags layer
//! on top in the CLI.

use serde::{Deserialize, Serialize};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where session hints come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintSource {
    #[default]
    Gemini,
    Heuristic,
}

impl std::str::FromStr for HintSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(HintSource::Gemini),
            "heuristic" | "local" => Ok(HintSource::Heuristic),
            other => Err(format!("unknown hint source: {other}")),
        }
    }
}

/// Gemini REST settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    /// Per-request timeout for the hint call.
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SizefitConfig {
    pub hint_source: HintSource,
    pub gemini: GeminiConfig,
}

impl SizefitConfig {
    /// Read configuration from the process environment.
    ///
    /// - `GEMINI_API_KEY`, falling back to `API_KEY`
    /// - `SIZEFIT_MODEL`
    /// - `SIZEFIT_TIMEOUT_SECS`
    /// - `SIZEFIT_HINT_SOURCE` (`gemini` or `heuristic`)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.gemini.api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("API_KEY"))
            .filter(|key| !key.trim().is_empty());

        if let Some(model) = lookup("SIZEFIT_MODEL").filter(|m| !m.is_empty()) {
            config.gemini.model = model;
        }
        if let Some(secs) = lookup("SIZEFIT_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            config.gemini.timeout_secs = secs;
        }
        if let Some(source) = lookup("SIZEFIT_HINT_SOURCE").and_then(|s| s.parse().ok()) {
            config.hint_source = source;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SizefitConfig::from_lookup(lookup(&[]));
        assert_eq!(config.hint_source, HintSource::Gemini);
        assert_eq!(config.gemini.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.gemini.timeout_secs, 30);
        assert!(config.gemini.api_key.is_none());
    }

    #[test]
    fn test_api_key_fallback() {
        let config = SizefitConfig::from_lookup(lookup(&[("API_KEY", "legacy")]));
        assert_eq!(config.gemini.api_key.as_deref(), Some("legacy"));

        let config = SizefitConfig::from_lookup(lookup(&[
            ("API_KEY", "legacy"),
            ("GEMINI_API_KEY", "preferred"),
        ]));
        assert_eq!(config.gemini.api_key.as_deref(), Some("preferred"));
    }

    #[test]
    fn test_overrides() {
        let config = SizefitConfig::from_lookup(lookup(&[
            ("SIZEFIT_MODEL", "gemini-2.5-pro"),
            ("SIZEFIT_TIMEOUT_SECS", "5"),
            ("SIZEFIT_HINT_SOURCE", "heuristic"),
        ]));
        assert_eq!(config.gemini.model, "gemini-2.5-pro");
        assert_eq!(config.gemini.timeout_secs, 5);
        assert_eq!(config.hint_source, HintSource::Heuristic);
    }

    #[test]
    fn test_bad_timeout_ignored() {
        let config = SizefitConfig::from_lookup(lookup(&[("SIZEFIT_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.gemini.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SizefitConfig =
            serde_json::from_str(r#"{"hint_source": "heuristic", "gemini": {"timeout_secs": 10}}"#)
                .unwrap();
        assert_eq!(config.hint_source, HintSource::Heuristic);
        assert_eq!(config.gemini.timeout_secs, 10);
        assert_eq!(config.gemini.model, DEFAULT_GEMINI_MODEL);
    }
}
