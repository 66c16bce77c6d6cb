//! # Runtime Configuration Module
//!
//! Process-level overrides read from environment variables. They take
//! precedence over `proxygen.toml` and are applied with
//! [`RuntimeConfig::apply`].
//!
//! Both variables feed [`PublishSettings`](crate::config::PublishSettings),
//! which only [`publish_bundle`](crate::publish::publish_bundle) reads. The
//! `proxygen` binary has no remote repository to publish to, so they matter
//! to library callers that supply a
//! [`RemoteRepository`](crate::publish::RemoteRepository) and are inert for
//! the CLI.
//!
//! ## Environment Variables
//!
//! ### `PROXYGEN_BATCH_SIZE`
//!
//! Files per push request when publishing a bundle. Accepts decimal values
//! only; anything unparsable or `0` is ignored.
//!
//! ### `PROXYGEN_BRANCH`
//!
//! Branch bundles are published to.
//!
//! ## Usage
//!
//! ```rust
//! use proxygen::config::GeneratorSettings;
//! use proxygen::runtime_config::RuntimeConfig;
//!
//! let mut settings = GeneratorSettings::default();
//! RuntimeConfig::from_env().apply(&mut settings);
//! println!("batch size: {}", settings.publish.batch_size);
//! ```

use std::env;

use crate::config::GeneratorSettings;

/// Overrides loaded from environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub batch_size: Option<usize>,
    pub branch: Option<String>,
}

fn parse_batch_size(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        RuntimeConfig {
            batch_size: env::var("PROXYGEN_BATCH_SIZE")
                .ok()
                .and_then(|v| parse_batch_size(&v)),
            branch: env::var("PROXYGEN_BRANCH")
                .ok()
                .filter(|b| !b.trim().is_empty()),
        }
    }

    pub fn apply(&self, settings: &mut GeneratorSettings) {
        if let Some(batch_size) = self.batch_size {
            settings.publish.batch_size = batch_size;
        }
        if let Some(branch) = &self.branch {
            settings.publish.branch = branch.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch_size() {
        assert_eq!(parse_batch_size("50"), Some(50));
        assert_eq!(parse_batch_size(" 7 "), Some(7));
        assert_eq!(parse_batch_size("0"), None);
        assert_eq!(parse_batch_size("0x10"), None);
    }

    #[test]
    fn test_apply_overrides_only_set_values() {
        let mut settings = GeneratorSettings::default();
        RuntimeConfig {
            batch_size: Some(10),
            branch: None,
        }
        .apply(&mut settings);
        assert_eq!(settings.publish.batch_size, 10);
        assert_eq!(settings.publish.branch, "main");
    }
}
