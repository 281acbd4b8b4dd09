use crate::api::Backend;
use std::{env, path::PathBuf};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_API_URL: &str = "http://localhost:8081";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub storage_path: PathBuf,
    pub api_url: String,
    pub backend: Backend,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any variable source; unset keys use their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let data_path = lookup("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/state.json"));

        let storage_path = lookup("APP_STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/local_storage.json"));

        let api_url = lookup("GARDEN_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let backend = match lookup("GARDEN_BACKEND") {
            Some(value) => value.parse::<Backend>().unwrap_or_else(|err| {
                warn!("{err}, falling back to the hosted backend");
                Backend::Hosted
            }),
            None => Backend::Hosted,
        };

        Self {
            port,
            data_path,
            storage_path,
            api_url,
            backend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config(&[]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.data_path, PathBuf::from("data/state.json"));
        assert_eq!(config.storage_path, PathBuf::from("data/local_storage.json"));
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.backend, Backend::Hosted);
    }

    #[test]
    fn backend_and_url_come_from_the_environment() {
        let config = config(&[
            ("GARDEN_BACKEND", "pg"),
            ("GARDEN_API_URL", "http://api.local/"),
            ("PORT", "9000"),
        ]);
        assert_eq!(config.backend, Backend::Postgres);
        assert_eq!(config.api_url, "http://api.local");
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn unknown_backend_falls_back_to_hosted() {
        assert_eq!(config(&[("GARDEN_BACKEND", "mongo")]).backend, Backend::Hosted);
        assert_eq!(config(&[("PORT", "not-a-port")]).port, DEFAULT_PORT);
    }
}
