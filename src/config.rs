//! Runtime configuration
//!
//! Read once at startup from `KJ_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Default interval between orphan sweeps, in seconds
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_path: PathBuf,
    /// Interval between sweeps of unsaved journal meals. Also the minimum age
    /// of a swept row.
    pub sweep_interval_secs: u64,
}

impl Config {
    /// Load configuration from the environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup("KJ_DATABASE_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let sweep_interval_secs = match lookup("KJ_SWEEP_INTERVAL_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    tracing::warn!(
                        "ignoring KJ_SWEEP_INTERVAL_SECS={:?}, using {}",
                        raw,
                        DEFAULT_SWEEP_INTERVAL_SECS
                    );
                    DEFAULT_SWEEP_INTERVAL_SECS
                }
            },
            None => DEFAULT_SWEEP_INTERVAL_SECS,
        };

        Self {
            database_path,
            sweep_interval_secs,
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// `<project>/data/kilojoules.db`, found from the executable location
fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("kilojoules.db");
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.sweep_interval_secs, DEFAULT_SWEEP_INTERVAL_SECS);
        assert!(config.database_path.ends_with("data/kilojoules.db"));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("KJ_DATABASE_PATH", "/tmp/kj.db"),
            ("KJ_SWEEP_INTERVAL_SECS", "60"),
        ]);
        assert_eq!(config.database_path, PathBuf::from("/tmp/kj.db"));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_bad_interval_falls_back() {
        assert_eq!(config(&[("KJ_SWEEP_INTERVAL_SECS", "soon")]).sweep_interval_secs, 3600);
        assert_eq!(config(&[("KJ_SWEEP_INTERVAL_SECS", "0")]).sweep_interval_secs, 3600);
    }
}
