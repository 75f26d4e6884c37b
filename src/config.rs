use std::env;
use std::net::SocketAddr;

use crate::error::ConfigError;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_STATIC_FILES_PATH: &str = "static";
const DEFAULT_WORD_LIST: &str = "words.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub dictionary_path: String,
    pub static_files_path: String,
}

impl Config {
    /// Reads `.env` if there is one, then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse()
            .map_err(|_| ConfigError::BindAddr(raw_addr.clone()))?;

        let static_files_path =
            lookup("STATIC_FILES_PATH").unwrap_or_else(|| DEFAULT_STATIC_FILES_PATH.to_string());
        let dictionary_path = lookup("DICTIONARY_PATH")
            .unwrap_or_else(|| format!("{}/{}", static_files_path, DEFAULT_WORD_LIST));

        Ok(Self {
            bind_addr,
            dictionary_path,
            static_files_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.static_files_path, "static");
        assert_eq!(config.dictionary_path, "static/words.txt");
    }

    #[test]
    fn test_word_list_follows_static_path() {
        let config = Config::from_lookup(lookup(&[("STATIC_FILES_PATH", "/app/static")])).unwrap();
        assert_eq!(config.dictionary_path, "/app/static/words.txt");

        let config = Config::from_lookup(lookup(&[
            ("STATIC_FILES_PATH", "/app/static"),
            ("DICTIONARY_PATH", "/data/kana.txt"),
        ]))
        .unwrap();
        assert_eq!(config.dictionary_path, "/data/kana.txt");
    }

    #[test]
    fn test_bad_bind_addr() {
        let err = Config::from_lookup(lookup(&[("BIND_ADDR", "localhost")])).unwrap_err();
        assert!(matches!(err, ConfigError::BindAddr(addr) if addr == "localhost"));
    }
}
