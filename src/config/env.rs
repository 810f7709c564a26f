//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;
use std::path::PathBuf;

use super::{AppConfig, ExpectedMode};
use crate::error::HarnessError;

/// Environment variable prefix
const ENV_PREFIX: &str = "GOLDEN_RUNNER";

/// Overrides read from `GOLDEN_RUNNER_*` variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Fixture directory from GOLDEN_RUNNER_DIR
    pub fixtures_dir: Option<String>,
    /// Fixture extension from GOLDEN_RUNNER_EXTENSION
    pub extension: Option<String>,
    /// Timeout from GOLDEN_RUNNER_TIMEOUT_MS
    pub timeout_ms: Option<u64>,
    /// Worker count from GOLDEN_RUNNER_WORKERS
    pub workers: Option<usize>,
    /// Evaluator program from GOLDEN_RUNNER_EVALUATOR
    pub evaluator: Option<String>,
    /// Expected mode from GOLDEN_RUNNER_EXPECTED
    pub expected_mode: Option<String>,
    /// Config file from GOLDEN_RUNNER_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            fixtures_dir: get_env("DIR"),
            extension: get_env("EXTENSION"),
            timeout_ms: get_env_parse("TIMEOUT_MS"),
            workers: get_env_parse("WORKERS"),
            evaluator: get_env("EVALUATOR"),
            expected_mode: get_env("EXPECTED"),
            config_file: get_env("CONFIG"),
        }
    }

    /// Apply the variables that are set on top of `config`
    pub fn apply(&self, config: &mut AppConfig) -> Result<(), HarnessError> {
        if let Some(dir) = &self.fixtures_dir {
            config.fixtures_dir = PathBuf::from(dir);
        }
        if let Some(extension) = &self.extension {
            config.extension = extension.trim_start_matches('.').to_string();
        }
        if let Some(timeout) = self.timeout_ms {
            config.timeout_ms = timeout;
        }
        if let Some(workers) = self.workers {
            config.workers = Some(workers);
        }
        if let Some(program) = &self.evaluator {
            config.evaluator.program = program.clone();
        }
        if let Some(mode) = &self.expected_mode {
            config.expected_mode = ExpectedMode::from_str(mode).ok_or_else(|| {
                HarnessError::Config(format!("{ENV_PREFIX}_EXPECTED: unknown mode '{mode}'"))
            })?;
        }
        Ok(())
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Guard that restores environment variables on drop
#[cfg(test)]
struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

#[cfg(test)]
impl EnvGuard {
    fn set(vars: &[(&str, &str)]) -> Self {
        let previous = vars
            .iter()
            .map(|(name, value)| {
                let key = format!("{ENV_PREFIX}_{name}");
                let old = env::var(&key).ok();
                env::set_var(&key, value);
                (key, old)
            })
            .collect();
        Self { previous }
    }
}

#[cfg(test)]
impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}
