use crate::auth::{HttpAuth, SessionToken};
use crate::docstore::HttpDocumentStore;
use crate::service::NoteService;
use crate::store::{NoteStore, SaveMode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_API_URL: &str = "http://localhost:6689";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EnvConfig {
    pub api_url: String,
    #[serde(default)]
    pub save_mode: SaveMode,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. `NOTEKEEPER_API_URL` wins over the plain `API_URL`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = ["NOTEKEEPER_API_URL", "API_URL"]
            .into_iter()
            .filter_map(|key| lookup(key))
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .find(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let save_mode = match lookup("NOTEKEEPER_SAVE_MODE") {
            None => SaveMode::default(),
            Some(raw) if raw.trim().is_empty() => SaveMode::default(),
            Some(raw) => SaveMode::from_str(raw.trim()).unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "unknown NOTEKEEPER_SAVE_MODE; using sequential");
                SaveMode::Sequential
            }),
        };

        Self { api_url, save_mode }
    }

    /// Service over the HTTP backends, both sharing one session token.
    pub fn http_service(&self) -> NoteService<HttpDocumentStore, HttpAuth> {
        let token = SessionToken::new();
        let docs = HttpDocumentStore::new(self.api_url.as_str(), token.clone());
        let auth = HttpAuth::new(self.api_url.as_str(), token);
        NoteService::new(NoteStore::new(docs).with_save_mode(self.save_mode), auth)
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            save_mode: SaveMode::default(),
        }
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
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_env_config_defaults() {
        let cfg = EnvConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg, EnvConfig::default());
        assert_eq!(cfg.api_url, "http://localhost:6689");
        assert_eq!(cfg.save_mode, SaveMode::Sequential);
    }

    #[test]
    fn test_env_config_prefers_prefixed_url() {
        let cfg = EnvConfig::from_lookup(lookup(&[
            ("API_URL", "http://fallback"),
            ("NOTEKEEPER_API_URL", "https://notes.example.com/"),
        ]));
        assert_eq!(cfg.api_url, "https://notes.example.com");

        let cfg = EnvConfig::from_lookup(lookup(&[("API_URL", "http://fallback")]));
        assert_eq!(cfg.api_url, "http://fallback");
    }

    #[test]
    fn test_env_config_blank_url_falls_through() {
        let cfg = EnvConfig::from_lookup(lookup(&[
            ("NOTEKEEPER_API_URL", "  "),
            ("API_URL", "http://fallback"),
        ]));
        assert_eq!(cfg.api_url, "http://fallback");
    }

    #[test]
    fn test_env_config_save_mode() {
        let cfg = EnvConfig::from_lookup(lookup(&[("NOTEKEEPER_SAVE_MODE", "Batched")]));
        assert_eq!(cfg.save_mode, SaveMode::Batched);

        let cfg = EnvConfig::from_lookup(lookup(&[("NOTEKEEPER_SAVE_MODE", "fast")]));
        assert_eq!(cfg.save_mode, SaveMode::Sequential);
    }

    #[test]
    fn test_http_service_uses_config() {
        let cfg = EnvConfig {
            api_url: "http://localhost:1".to_string(),
            save_mode: SaveMode::Batched,
        };
        let svc = cfg.http_service();
        assert_eq!(svc.store().save_mode(), SaveMode::Batched);
        assert_eq!(svc.session().token().get(), None);
    }
}
