//! Environment synthesis
//!
//! Builds one environment document per run argument. Each document carries a
//! deterministic identifier and the configured template with the argument
//! substituted into it.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

use crate::error::FanoutError;
use crate::models::RunRequest;

/// Namespace every argument is appended to before hashing
pub const BASE_NAMESPACE_URI: &str = "https://suite-fanout.dev/environments/";

/// Display name written into every environment
pub const ENVIRONMENT_NAME: &str = "ExampleKey";

/// Exporter string the engine expects in the footer
pub const EXPORTED_USING: &str = "Postman/5.5.0";

/// Template used when none is configured or the configured one is missing
pub const DEFAULT_TEMPLATE: &str = "%s";

const PLACEHOLDER: &str = "%s";

/// Produces environments for the runs of one invocation
#[derive(Clone, Debug)]
pub struct EnvironmentFactory {
    template: String,
    namespace: String,
}

impl EnvironmentFactory {
    pub fn new() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            namespace: BASE_NAMESPACE_URI.to_string(),
        }
    }

    /// Load the template from `path`.
    ///
    /// A path that does not exist falls back to the default template. A path
    /// that exists but cannot be read as ASCII text is a configuration error.
    pub fn from_template_path(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::new());
        };

        if !path.exists() {
            debug!(
                "Template {} not found, using default template",
                path.display()
            );
            return Ok(Self::new());
        }

        let raw = std::fs::read(path)
            .map_err(|e| FanoutError::config(format!("cannot read template {}: {e}", path.display())))
            .with_context(|| format!("Failed to load template: {}", path.display()))?;

        if !raw.is_ascii() {
            return Err(FanoutError::config(format!(
                "template {} is not ASCII text",
                path.display()
            ))
            .into());
        }

        let template = String::from_utf8_lossy(&raw).into_owned();
        debug!("Loaded template from {} ({} bytes)", path.display(), raw.len());

        Ok(Self::new().with_template(template))
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    #[cfg(test)]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Build the environment for one run
    pub fn build(&self, request: &RunRequest) -> Environment {
        let argument = request.argument();
        let identifier = derive_identifier(&self.namespace, argument);

        debug!(
            "Built environment {} for {} (argument {:?})",
            identifier,
            request.suite_label(),
            argument
        );

        Environment {
            identifier,
            argument: argument.to_string(),
            values: substitute(&self.template, argument),
            exported_at: Utc::now(),
        }
    }
}

impl Default for EnvironmentFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// UUID v5 (DNS namespace) of `namespace` joined with `argument`
pub fn derive_identifier(namespace: &str, argument: &str) -> Uuid {
    let reference = format!("{namespace}{argument}");
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, reference.as_bytes())
}

/// Replace the first `%s` in `template` with `argument`
pub fn substitute(template: &str, argument: &str) -> String {
    template.replacen(PLACEHOLDER, argument, 1)
}

/// A generated environment, serialized only when its file is ready
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Environment {
    identifier: Uuid,
    argument: String,
    values: String,
    exported_at: DateTime<Utc>,
}

impl Environment {
    pub fn identifier(&self) -> Uuid {
        self.identifier
    }

    pub fn argument(&self) -> &str {
        &self.argument
    }

    /// Serialized environment document
    pub fn body(&self) -> String {
        let header = format!(
            "{{\n  \"id\": \"{}\",\n  \"name\": \"{}\",\n  \"values\": [\n",
            self.identifier, ENVIRONMENT_NAME
        );
        let footer = format!(
            "\n  ],\n  \"_postman_variable_scope\": \"globals\",\n  \"_postman_exported_at\": \"{}\",\n  \"_postman_exported_using\": \"{}\"\n}}",
            self.exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            EXPORTED_USING
        );

        format!("{header}{}{footer}", self.values).trim().to_string()
    }
}
