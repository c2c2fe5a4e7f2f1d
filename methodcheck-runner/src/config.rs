//! Configuration loading from methodcheck.toml
//!
//! Session settings can be specified in a `methodcheck.toml` file in the project root.
//! The configuration is discovered by walking up from the current directory.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Methodcheck configuration file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CheckConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Member access configuration
    #[serde(default)]
    pub access: AccessConfig,
    /// Output comparison configuration
    #[serde(default)]
    pub comparison: ComparisonConfig,
}

/// Executor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Per-invocation deadline (e.g., "3s", "500ms")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Fixed worker pool width
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Default generator rounds for sessions with a generator
    #[serde(default = "default_generation_rounds")]
    pub generation_rounds: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            workers: default_workers(),
            generation_rounds: default_generation_rounds(),
        }
    }
}

fn default_timeout() -> String {
    "3s".to_string()
}
fn default_workers() -> usize {
    16
}
fn default_generation_rounds() -> usize {
    10
}

/// Access configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Force-enable invocation of private members
    #[serde(default = "default_allow_private")]
    pub allow_private: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            allow_private: default_allow_private(),
        }
    }
}

fn default_allow_private() -> bool {
    true
}

/// Comparison configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ComparisonConfig {
    /// Treat a null candidate return as matching any expected value
    #[serde(default)]
    pub lenient_null_returns: bool,
}

impl CheckConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let dir = std::env::current_dir().ok()?;
        Self::discover_from(dir)
    }

    /// Walk up from `start` looking for `methodcheck.toml`
    pub fn discover_from(start: impl AsRef<Path>) -> Option<Self> {
        let mut dir = start.as_ref().to_path_buf();
        loop {
            let config_path = dir.join("methodcheck.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# Methodcheck Configuration

[runner]
# Deadline for a single candidate or reference invocation
timeout = "3s"
# Fixed worker pool width (each test case uses at most two workers)
workers = 16
# Generator rounds for sessions that supply a generator
generation_rounds = 10

[access]
# Force-enable invocation of private members
allow_private = true

[comparison]
# Accept a null candidate return for any expected value
lenient_null_returns = false
"#
        .to_string()
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m")
    pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Invalid duration: {}", s));
        }

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok(Duration::from_nanos((value * multiplier as f64) as u64))
    }
}

/// How a null candidate return is compared against the reference output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullReturnPolicy {
    /// `Null` only equals `Null`
    #[default]
    Strict,
    /// A null candidate return matches any expected value
    Lenient,
}

/// Resolved settings for one verification session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Per-invocation deadline
    pub timeout: Duration,
    /// Worker pool width
    pub workers: usize,
    /// Whether private members may be force-invoked
    pub allow_private_access: bool,
    /// Null-return comparison policy
    pub null_returns: NullReturnPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            workers: 16,
            allow_private_access: true,
            null_returns: NullReturnPolicy::Strict,
        }
    }
}

impl SessionConfig {
    /// Resolve a parsed configuration file
    pub fn from_check_config(config: &CheckConfig) -> anyhow::Result<Self> {
        let timeout = CheckConfig::parse_duration(&config.runner.timeout)?;
        if timeout.is_zero() {
            return Err(anyhow::anyhow!("runner.timeout must be greater than zero"));
        }
        if config.runner.workers < 2 {
            return Err(anyhow::anyhow!(
                "runner.workers must be at least 2, got {}",
                config.runner.workers
            ));
        }

        Ok(Self {
            timeout,
            workers: config.runner.workers,
            allow_private_access: config.access.allow_private,
            null_returns: if config.comparison.lenient_null_returns {
                NullReturnPolicy::Lenient
            } else {
                NullReturnPolicy::Strict
            },
        })
    }

    /// Override the per-invocation deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the worker pool width.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Allow or forbid invoking private members.
    pub fn with_private_access(mut self, allow: bool) -> Self {
        self.allow_private_access = allow;
        self
    }

    /// Set the null-return comparison policy.
    pub fn with_null_returns(mut self, policy: NullReturnPolicy) -> Self {
        self.null_returns = policy;
        self
    }
}
