//! Engine configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use adaptest_core::engine::EngineConfig;

/// Top-level adaptest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptestConfig {
    /// Lessons per recommendation set.
    #[serde(default = "default_recommendation_count")]
    pub recommendation_count: usize,
    /// Days that must pass before a retest.
    #[serde(default = "default_retest_interval_days")]
    pub retest_interval_days: i64,
    /// Completed activities that unlock a retest early.
    #[serde(default = "default_retest_after_n_activities")]
    pub retest_after_n_activities: u32,
    /// Lifetime of a placement session in hours.
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    /// Questions in an auto-built placement assessment.
    #[serde(default = "default_placement_question_limit")]
    pub placement_question_limit: usize,
    /// Where question banks are looked up when no path is given.
    #[serde(default = "default_bank_dir")]
    pub bank_dir: PathBuf,
}

fn default_recommendation_count() -> usize {
    6
}
fn default_retest_interval_days() -> i64 {
    14
}
fn default_retest_after_n_activities() -> u32 {
    8
}
fn default_session_ttl_hours() -> i64 {
    24
}
fn default_placement_question_limit() -> usize {
    20
}
fn default_bank_dir() -> PathBuf {
    PathBuf::from("./banks")
}

impl Default for AdaptestConfig {
    fn default() -> Self {
        Self {
            recommendation_count: default_recommendation_count(),
            retest_interval_days: default_retest_interval_days(),
            retest_after_n_activities: default_retest_after_n_activities(),
            session_ttl_hours: default_session_ttl_hours(),
            placement_question_limit: default_placement_question_limit(),
            bank_dir: default_bank_dir(),
        }
    }
}

impl AdaptestConfig {
    /// The engine knobs this configuration describes. Durations too large
    /// to represent saturate; loaded configs have already rejected them.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            recommendation_count: self.recommendation_count,
            retest_interval: Duration::try_days(self.retest_interval_days)
                .unwrap_or(Duration::MAX),
            retest_activity_threshold: self.retest_after_n_activities,
            session_ttl: Duration::try_hours(self.session_ttl_hours).unwrap_or(Duration::MAX),
            placement_question_limit: self.placement_question_limit,
        }
    }

    /// Apply `ADAPTEST_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_override(&lookup, "ADAPTEST_RECOMMENDATION_COUNT")? {
            self.recommendation_count = v;
        }
        if let Some(v) = parse_override(&lookup, "ADAPTEST_RETEST_INTERVAL_DAYS")? {
            self.retest_interval_days = v;
        }
        if let Some(v) = parse_override(&lookup, "ADAPTEST_RETEST_AFTER_N_ACTIVITIES")? {
            self.retest_after_n_activities = v;
        }
        if let Some(v) = parse_override(&lookup, "ADAPTEST_SESSION_TTL_HOURS")? {
            self.session_ttl_hours = v;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.retest_interval_days < 0 {
            anyhow::bail!("retest_interval_days must not be negative");
        }
        if Duration::try_days(self.retest_interval_days).is_none() {
            anyhow::bail!(
                "retest_interval_days is out of range: {}",
                self.retest_interval_days
            );
        }
        if self.session_ttl_hours <= 0 {
            anyhow::bail!("session_ttl_hours must be positive");
        }
        if Duration::try_hours(self.session_ttl_hours).is_none() {
            anyhow::bail!("session_ttl_hours is out of range: {}", self.session_ttl_hours);
        }
        Ok(())
    }
}

fn parse_override<T, F>(lookup: &F, var: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("invalid value for {var}: {raw:?}"))
        })
        .transpose()
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `adaptest.toml` in the current directory
/// 2. `~/.config/adaptest/config.toml`
///
/// Environment variable overrides: `ADAPTEST_RECOMMENDATION_COUNT`,
/// `ADAPTEST_RETEST_INTERVAL_DAYS`, `ADAPTEST_RETEST_AFTER_N_ACTIVITIES`,
/// `ADAPTEST_SESSION_TTL_HOURS`.
pub fn load_config() -> Result<AdaptestConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AdaptestConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("adaptest.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            parse_config_file(&path)?
        }
        None => AdaptestConfig::default(),
    };

    config.apply_overrides(|var| std::env::var(var).ok())?;
    config.validate()?;
    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<AdaptestConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<AdaptestConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("adaptest"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn default_config() {
        let config = AdaptestConfig::default();
        assert_eq!(config.recommendation_count, 6);
        assert_eq!(config.retest_interval_days, 14);
        assert_eq!(config.retest_after_n_activities, 8);

        let engine = config.engine_config();
        assert_eq!(engine.session_ttl, Duration::hours(24));
        assert_eq!(engine.placement_question_limit, 20);
    }

    #[test]
    fn parse_partial_file() {
        let config: AdaptestConfig = toml::from_str(
            r#"
recommendation_count = 4
bank_dir = "content/banks"
"#,
        )
        .unwrap();
        assert_eq!(config.recommendation_count, 4);
        assert_eq!(config.retest_interval_days, 14);
        assert_eq!(config.bank_dir, PathBuf::from("content/banks"));
    }

    #[test]
    fn env_overrides_win() {
        let mut config = AdaptestConfig::default();
        config
            .apply_overrides(env(&[
                ("ADAPTEST_RETEST_INTERVAL_DAYS", "7"),
                ("ADAPTEST_RETEST_AFTER_N_ACTIVITIES", " 3 "),
            ]))
            .unwrap();
        assert_eq!(config.retest_interval_days, 7);
        assert_eq!(config.retest_after_n_activities, 3);
        assert_eq!(config.recommendation_count, 6);
        assert_eq!(config.engine_config().retest_interval, Duration::days(7));
    }

    #[test]
    fn non_numeric_override_is_an_error() {
        let mut config = AdaptestConfig::default();
        let err = config
            .apply_overrides(env(&[("ADAPTEST_RECOMMENDATION_COUNT", "many")]))
            .unwrap_err();
        assert!(err.to_string().contains("ADAPTEST_RECOMMENDATION_COUNT"));
    }

    #[test]
    fn load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adaptest.toml");
        std::fs::write(&path, "session_ttl_hours = 2\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.session_ttl_hours, 2);
    }

    #[test]
    fn missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_from(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adaptest.toml");
        std::fs::write(&path, "session_ttl_hours = 0\n").unwrap();
        assert!(load_config_from(Some(&path)).is_err());

        std::fs::write(&path, "recommendation_count = \"six\"\n").unwrap();
        let err = load_config_from(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn unrepresentable_durations_are_rejected() {
        let mut config = AdaptestConfig::default();
        config
            .apply_overrides(env(&[("ADAPTEST_RETEST_INTERVAL_DAYS", "9223372036854775807")]))
            .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("retest_interval_days is out of range"));
        assert_eq!(config.engine_config().retest_interval, Duration::MAX);

        let mut config = AdaptestConfig::default();
        config.session_ttl_hours = i64::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("session_ttl_hours is out of range"));
    }

    #[test]
    fn largest_representable_interval_is_accepted() {
        let mut config = AdaptestConfig::default();
        config.retest_interval_days = 100_000_000;
        assert!(config.validate().is_ok());
        assert_eq!(config.engine_config().retest_interval, Duration::days(100_000_000));
    }
}
