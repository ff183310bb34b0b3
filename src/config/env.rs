//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "SUITE_FANOUT";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Timeout from SUITE_FANOUT_TIMEOUT (milliseconds)
    pub timeout: Option<u64>,
    /// Folder from SUITE_FANOUT_FOLDER
    pub folder: Option<String>,
    /// Template from SUITE_FANOUT_TEMPLATE
    pub template: Option<String>,
    /// Engine executable from SUITE_FANOUT_NEWMAN
    pub newman: Option<String>,
    /// Verbose from SUITE_FANOUT_VERBOSE
    pub verbose: Option<bool>,
    /// Quiet from SUITE_FANOUT_QUIET
    pub quiet: Option<bool>,
    /// Log level from SUITE_FANOUT_LOG
    pub log_level: Option<String>,
    /// Config file from SUITE_FANOUT_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            timeout: get_env_parse("TIMEOUT"),
            folder: get_env("FOLDER"),
            template: get_env("TEMPLATE"),
            newman: get_env("NEWMAN"),
            verbose: get_env_bool("VERBOSE"),
            quiet: get_env_bool("QUIET"),
            log_level: get_env("LOG"),
            config_file: get_env("CONFIG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.timeout.is_some()
            || self.folder.is_some()
            || self.template.is_some()
            || self.newman.is_some()
            || self.verbose.is_some()
            || self.quiet.is_some()
            || self.log_level.is_some()
            || self.config_file.is_some()
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

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

#[cfg(test)]
pub(crate) struct EnvBuilder {
    vars: Vec<(String, String)>,
}

#[cfg(test)]
impl EnvBuilder {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    pub fn set(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_{name}"), value.into()));
        self
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        for (key, value) in self.vars {
            env::set_var(key, value);
        }

        EnvGuard { previous }
    }
}

/// Guard that restores environment variables on drop
#[cfg(test)]
pub(crate) struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_config_default() {
        let config = EnvConfig::default();
        assert!(config.timeout.is_none());
        assert!(!config.has_any());
    }

    #[test]
    fn test_env_builder() {
        let _guard = EnvBuilder::new()
            .set("TIMEOUT", "4500")
            .set("FOLDER", "Collections")
            .apply_scoped();

        let config = EnvConfig::load();
        assert_eq!(config.timeout, Some(4500));
        assert_eq!(config.folder, Some("Collections".to_string()));
        assert!(config.has_any());
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = EnvBuilder::new().set("QUIET", "yes").apply_scoped();

        let config = EnvConfig::load();
        assert_eq!(config.quiet, Some(true));
    }
}
