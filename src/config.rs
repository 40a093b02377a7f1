use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.themoviedb.org/3";
const DEFAULT_DATA_DIR: &str = ".nowplaying";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ACCESS_KEY_VARS: [&str; 2] = ["TMDB_ACCESS_KEY", "TmdbAccessKey"];

#[derive(Debug, Clone)]
pub struct Config {
    // Absence is only fatal once the catalog client is built.
    pub access_key: Option<String>,
    pub api_base: String,
    pub data_dir: PathBuf,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_key = ACCESS_KEY_VARS
            .iter()
            .find_map(|k| lookup(*k).filter(|v| !v.trim().is_empty()));
        let api_base = lookup("TMDB_API_BASE")
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let data_dir = lookup("NOWPLAYING_DATA_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let timeout = match lookup("TMDB_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("TMDB_TIMEOUT_SECS is not a number: '{}'", raw))?;
                if secs == 0 {
                    anyhow::bail!("TMDB_TIMEOUT_SECS must be greater than zero");
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            access_key,
            api_base,
            data_dir,
            timeout,
        })
    }
}
