//! Scenario file handling
//!
//! A scenario describes an initial run and an optional redirection:
//!
//! ```toml
//! [worker]
//! tick_ms = 1000
//!
//! [initial]
//! from = 10.0
//! to = 0.0
//! duration_ms = 10000
//!
//! [redirect]
//! after_ms = 5500
//! to = 10.0
//! duration_ms = 5000
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use glide_animation::{Easing, RunConfig, WorkerConfig};
use serde::{Deserialize, Serialize};

/// A full demo run loaded from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Scenario {
    #[serde(default)]
    pub worker: WorkerConfig,
    pub initial: RunConfig,
    #[serde(default)]
    pub redirect: Option<Redirect>,
}

/// Restart toward a new target once `after_ms` has passed
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Redirect {
    pub after_ms: u64,
    #[serde(flatten)]
    pub run: RunConfig,
}

impl Redirect {
    pub fn after(&self) -> Duration {
        Duration::from_millis(self.after_ms)
    }
}

impl Scenario {
    /// Load a scenario from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        if scenario.worker.tick_ms == 0 {
            anyhow::bail!("worker.tick_ms must be greater than zero");
        }
        Ok(scenario)
    }

    /// 10 -> 0 over ten seconds, redirected back to 10 after 5.5 seconds
    pub fn demo() -> Self {
        Self {
            worker: WorkerConfig { tick_ms: 1000 },
            initial: RunConfig {
                to: 0.0,
                from: Some(10.0),
                duration_ms: 10_000,
                tick_ms: None,
                easing: Easing::LinearDrive,
            },
            redirect: Some(Redirect {
                after_ms: 5_500,
                run: RunConfig {
                    to: 10.0,
                    from: None,
                    duration_ms: 5_000,
                    tick_ms: None,
                    easing: Easing::LinearDrive,
                },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_scenario() {
        let scenario = Scenario::parse(
            r#"
            [worker]
            tick_ms = 250

            [initial]
            from = 1.0
            to = 2.0
            duration_ms = 1000
            easing = "exp-decay"

            [redirect]
            after_ms = 400
            to = -1.0
            duration_ms = 800
            "#,
        )
        .unwrap();

        assert_eq!(scenario.worker.tick_ms, 250);
        assert_eq!(scenario.initial.easing.name(), "exp-decay");
        let redirect = scenario.redirect.unwrap();
        assert_eq!(redirect.after(), Duration::from_millis(400));
        assert_eq!(redirect.run.to, -1.0);
        assert_eq!(redirect.run.duration_ms, 800);
    }

    #[test]
    fn test_parse_without_redirect() {
        let scenario = Scenario::parse("[initial]\nto = 4.0\nduration_ms = 100").unwrap();
        assert!(scenario.redirect.is_none());
        assert_eq!(scenario.worker, WorkerConfig::default());
    }

    #[test]
    fn test_zero_tick_rejected() {
        let parsed = Scenario::parse("[worker]\ntick_ms = 0\n[initial]\nto = 1.0");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_missing_initial_rejected() {
        assert!(Scenario::parse("[worker]\ntick_ms = 10").is_err());
    }
}
