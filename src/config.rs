//! Preprocessor configuration

use std::path::PathBuf;

use tracing::debug;

/// Root for `ExternalPhaseConfig.Path` when set
pub const PHASE_CONFIG_DIR_ENV: &str = "WORKLOAD_PHASE_CONFIG_DIR";
/// Enables smoke-test conversion when `1`, `true` or `yes`
pub const SMOKE_TEST_ENV: &str = "WORKLOAD_SMOKE_TEST";

/// What the `source` argument of [`crate::WorkloadParser::parse`] holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YamlSource {
    #[default]
    File,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessConfig {
    /// Directory external phase paths are resolved against
    pub phase_config_root: PathBuf,
    /// Rewrite phases into their smoke-test form after resolution
    pub smoke_test: bool,
}

impl PreprocessConfig {
    pub fn new(phase_config_root: impl Into<PathBuf>) -> Self {
        Self {
            phase_config_root: phase_config_root.into(),
            smoke_test: false,
        }
    }

    /// Build from the environment
    ///
    /// Root resolution order:
    /// 1. WORKLOAD_PHASE_CONFIG_DIR environment variable
    /// 2. Current working directory
    pub fn from_env() -> Self {
        let phase_config_root = std::env::var(PHASE_CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|_| std::env::current_dir())
            .unwrap_or_else(|_| PathBuf::from("."));

        let smoke_test = std::env::var(SMOKE_TEST_ENV)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        debug!(
            root = %phase_config_root.display(),
            smoke_test,
            "Preprocessor configuration from environment"
        );
        Self {
            phase_config_root,
            smoke_test,
        }
    }

    pub fn with_root(mut self, phase_config_root: impl Into<PathBuf>) -> Self {
        self.phase_config_root = phase_config_root.into();
        self
    }

    pub fn with_smoke_test(mut self, smoke_test: bool) -> Self {
        self.smoke_test = smoke_test;
        self
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
