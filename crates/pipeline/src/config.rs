use std::path::PathBuf;
use std::time::Duration;

use imagegen_core::execution::CliGenerator;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Delay between claim attempts (default: 2 s).
    pub poll_interval: Duration,
    /// Wall-clock limit for one generator invocation (default: 8 min).
    pub generation_timeout: Duration,
    /// Explicit generator binary. `None` resolves `./imagegen`, then `PATH`.
    pub generator_bin: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            generation_timeout: Duration::from_secs(480),
            generator_bin: None,
        }
    }
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                         |
    /// |---------------------------|---------------------------------|
    /// | `WORKER_POLL_INTERVAL_MS` | `2000`                          |
    /// | `GENERATION_TIMEOUT_SECS` | `480`                           |
    /// | `GENERATOR_BIN`           | `./imagegen` if present, else `imagegen` |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let poll_interval = std::env::var("WORKER_POLL_INTERVAL_MS")
            .map(|v| {
                Duration::from_millis(
                    v.parse()
                        .expect("WORKER_POLL_INTERVAL_MS must be a valid u64"),
                )
            })
            .unwrap_or(defaults.poll_interval);

        let generation_timeout = std::env::var("GENERATION_TIMEOUT_SECS")
            .map(|v| {
                Duration::from_secs(
                    v.parse()
                        .expect("GENERATION_TIMEOUT_SECS must be a valid u64"),
                )
            })
            .unwrap_or(defaults.generation_timeout);

        let generator_bin = std::env::var("GENERATOR_BIN")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Self {
            poll_interval,
            generation_timeout,
            generator_bin,
        }
    }

    /// Build the subprocess generator this configuration points at.
    pub fn generator(&self) -> CliGenerator {
        match &self.generator_bin {
            Some(bin) => CliGenerator::new(bin),
            None => CliGenerator::resolve_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.generation_timeout, Duration::from_secs(8 * 60));
    }

    #[test]
    fn explicit_binary_wins() {
        let config = WorkerConfig {
            generator_bin: Some(PathBuf::from("/opt/bin/imagegen")),
            ..Default::default()
        };
        assert_eq!(
            config.generator().binary(),
            std::path::Path::new("/opt/bin/imagegen")
        );
    }
}
