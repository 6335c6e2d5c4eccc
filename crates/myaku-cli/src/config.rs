use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Runtime configuration for every `myaku-cli` subcommand, loaded from an
/// optional TOML file with environment variable overrides, per `SPEC_FULL.md`
/// §1 ("explicit configuration structs loaded from TOML plus environment
/// variable overrides, surfaced as a single `MyakuConfig`").
///
/// Mirrors the shape of `meilisearch`'s `Opt`: a `Deserialize` struct with
/// `#[serde(default = ...)]` per field, read from TOML first, then
/// overridden field-by-field from `MYAKU_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MyakuConfig {
    /// Directory for the `heed`/LMDB index environment.
    pub index_path: PathBuf,
    /// `heed::EnvOpenOptions::map_size`, in bytes.
    pub index_map_size: usize,
    /// `redis` connection string for the first-page cache.
    pub first_page_cache_redis_url: String,
    /// `redis` connection string for the next-page cache.
    pub next_page_cache_redis_url: String,
    /// Directory the `tracing` subscriber writes log files under.
    ///
    /// Not used directly yet — `myaku-cli` currently logs to stderr only
    /// (see `logging::install`) — but kept as a config field since
    /// `spec.md`'s Environment section lists "log directory" as required
    /// configuration and a future file-writing layer should read it from
    /// here rather than grow a second config path.
    pub log_dir: PathBuf,
    /// `myaku_search::SearchConfig::max_page_num`.
    pub max_page_num: u32,
}

impl Default for MyakuConfig {
    fn default() -> Self {
        MyakuConfig {
            index_path: PathBuf::from("data.ms/index"),
            index_map_size: 10 * 1024 * 1024 * 1024,
            first_page_cache_redis_url: "redis://127.0.0.1:6379/0".to_string(),
            next_page_cache_redis_url: "redis://127.0.0.1:6379/1".to_string(),
            log_dir: PathBuf::from("logs/"),
            max_page_num: 50,
        }
    }
}

impl MyakuConfig {
    /// Loads config from `path` if given (erroring if it can't be read or
    /// parsed), falling back to defaults otherwise, then applies any
    /// `MYAKU_*` environment variable overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| anyhow::anyhow!("unable to read config file {}: {e}", path.display()))?;
                toml::from_str(&text)
                    .map_err(|e| anyhow::anyhow!("unable to parse config file {}: {e}", path.display()))?
            }
            None => MyakuConfig::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("MYAKU_INDEX_PATH") {
            self.index_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("MYAKU_INDEX_MAP_SIZE") {
            if let Ok(parsed) = v.parse() {
                self.index_map_size = parsed;
            }
        }
        if let Ok(v) = std::env::var("MYAKU_FIRST_PAGE_CACHE_REDIS_URL") {
            self.first_page_cache_redis_url = v;
        }
        if let Ok(v) = std::env::var("MYAKU_NEXT_PAGE_CACHE_REDIS_URL") {
            self.next_page_cache_redis_url = v;
        }
        if let Ok(v) = std::env::var("MYAKU_LOG_DIR") {
            self.log_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("MYAKU_MAX_PAGE_NUM") {
            if let Ok(parsed) = v.parse() {
                self.max_page_num = parsed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Serializes the two tests below: both read/write the same
    /// process-global `MYAKU_MAX_PAGE_NUM` env var.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_are_used_when_no_file_is_given() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("MYAKU_MAX_PAGE_NUM");
        let config = MyakuConfig::load(None).unwrap();
        assert_eq!(config.max_page_num, 50);
        assert_eq!(config.index_path, PathBuf::from("data.ms/index"));
    }

    #[test]
    fn env_override_wins_over_the_default() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("MYAKU_MAX_PAGE_NUM", "12");
        let config = MyakuConfig::load(None).unwrap();
        std::env::remove_var("MYAKU_MAX_PAGE_NUM");
        assert_eq!(config.max_page_num, 12);
    }
}
