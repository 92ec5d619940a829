//! Catalog configuration.
//!
//! Configuration is resolved from defaults, then overridden by `HIVECAT_*`
//! environment variables.

use std::time::Duration;

use hivecat_core::error::{Error, Result};
use hivecat_core::retry::RetryPolicy;
use hivecat_iceberg::FileFormat;
use serde::{Deserialize, Serialize};

/// How object ownership is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecurityMode {
    /// Access control is system-wide; owner fields are never written or read.
    System,
    /// Namespaces, tables and views record an owning principal.
    #[default]
    PerObject,
}

/// Catalog configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Name of this catalog, used to qualify storage tables.
    pub catalog_name: String,

    /// Ownership handling.
    pub security: SecurityMode,

    /// Whether to delete a namespace's directory on drop when it cannot be
    /// listed.
    pub delete_schema_locations_fallback: bool,

    /// Whether default table locations get a random suffix, so a new table
    /// never reuses the directory of a dropped one.
    pub unique_table_location: bool,

    /// Companion catalog that serves tables of other formats.
    pub redirect_catalog: Option<String>,

    /// Retry policy for materialized-view resolution.
    pub materialized_view_retry: RetryPolicy,

    /// Version stamped into records created by this catalog.
    pub engine_version: String,

    /// File format of materialized-view storage tables unless one is given.
    pub default_file_format: FileFormat,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            catalog_name: "iceberg".to_string(),
            security: SecurityMode::default(),
            delete_schema_locations_fallback: false,
            unique_table_location: true,
            redirect_catalog: None,
            materialized_view_retry: RetryPolicy::default(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            default_file_format: FileFormat::Parquet,
        }
    }
}

impl CatalogConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when a variable is set to an
    /// unparsable value or the result fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through a variable lookup function.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let mut config = Self::default();

        if let Some(name) = env.string("HIVECAT_CATALOG_NAME") {
            config.catalog_name = name;
        }
        if let Some(mode) = env.string("HIVECAT_SECURITY") {
            config.security = parse_security_mode("HIVECAT_SECURITY", &mode)?;
        }
        if let Some(fallback) = env.bool("HIVECAT_DELETE_SCHEMA_LOCATIONS_FALLBACK")? {
            config.delete_schema_locations_fallback = fallback;
        }
        if let Some(unique) = env.bool("HIVECAT_UNIQUE_TABLE_LOCATION")? {
            config.unique_table_location = unique;
        }
        config.redirect_catalog = env.string("HIVECAT_REDIRECT_CATALOG");
        if let Some(format) = env.string("HIVECAT_DEFAULT_FILE_FORMAT") {
            config.default_file_format = format.parse().map_err(|e| {
                Error::InvalidInput(format!("HIVECAT_DEFAULT_FILE_FORMAT: {e}"))
            })?;
        }

        let retry = &mut config.materialized_view_retry;
        if let Some(attempts) = env.u64("HIVECAT_MV_RETRY_MAX_ATTEMPTS")? {
            retry.max_attempts = u32::try_from(attempts).map_err(|_| {
                Error::InvalidInput("HIVECAT_MV_RETRY_MAX_ATTEMPTS is too large".to_string())
            })?;
        }
        if let Some(ms) = env.u64("HIVECAT_MV_RETRY_INITIAL_BACKOFF_MS")? {
            retry.initial_backoff_ms = ms;
        }
        if let Some(ms) = env.u64("HIVECAT_MV_RETRY_MAX_BACKOFF_MS")? {
            retry.max_backoff_ms = ms;
        }
        if let Some(ms) = env.u64("HIVECAT_MV_RETRY_MAX_DURATION_MS")? {
            retry.max_duration_ms = ms;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty catalog name or an invalid
    /// retry policy.
    pub fn validate(&self) -> Result<()> {
        if self.catalog_name.trim().is_empty() {
            return Err(Error::InvalidInput(
                "catalog_name must not be empty".to_string(),
            ));
        }
        if self
            .redirect_catalog
            .as_deref()
            .is_some_and(|target| target == self.catalog_name)
        {
            return Err(Error::InvalidInput(
                "redirect_catalog must differ from catalog_name".to_string(),
            ));
        }
        self.materialized_view_retry.validate()
    }

    /// Returns true under [`SecurityMode::System`].
    #[must_use]
    pub fn uses_system_security(&self) -> bool {
        self.security == SecurityMode::System
    }

    /// Value of the `trino_created_by` record parameter.
    #[must_use]
    pub fn created_by(&self) -> String {
        format!("hivecat {}", self.engine_version)
    }

    /// Overall retry budget for materialized-view resolution.
    #[must_use]
    pub fn materialized_view_retry_budget(&self) -> Duration {
        self.materialized_view_retry.max_duration()
    }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.0)(name).and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    fn u64(&self, name: &str) -> Result<Option<u64>> {
        let Some(v) = self.string(name) else {
            return Ok(None);
        };
        v.parse::<u64>()
            .map(Some)
            .map_err(|e| Error::InvalidInput(format!("{name} must be a u64: {e}")))
    }

    fn bool(&self, name: &str) -> Result<Option<bool>> {
        let Some(v) = self.string(name) else {
            return Ok(None);
        };
        parse_bool(name, &v).map(Some)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => Err(Error::InvalidInput(format!(
            "{name} must be a boolean (true/false/1/0)"
        ))),
    }
}

fn parse_security_mode(name: &str, value: &str) -> Result<SecurityMode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "system" => Ok(SecurityMode::System),
        "per-object" | "per_object" | "legacy" => Ok(SecurityMode::PerObject),
        _ => Err(Error::InvalidInput(format!(
            "{name} must be one of: system, per-object"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::default();
        assert_eq!(config.catalog_name, "iceberg");
        assert_eq!(config.security, SecurityMode::PerObject);
        assert!(!config.delete_schema_locations_fallback);
        assert!(config.unique_table_location);
        assert_eq!(config.materialized_view_retry.max_attempts, 10);
        assert_eq!(config.materialized_view_retry_budget(), Duration::from_secs(30));
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = CatalogConfig::from_lookup(lookup(&[
            ("HIVECAT_CATALOG_NAME", "lake"),
            ("HIVECAT_SECURITY", "SYSTEM"),
            ("HIVECAT_DELETE_SCHEMA_LOCATIONS_FALLBACK", "yes"),
            ("HIVECAT_REDIRECT_CATALOG", "hive"),
            ("HIVECAT_DEFAULT_FILE_FORMAT", "orc"),
            ("HIVECAT_MV_RETRY_MAX_ATTEMPTS", "3"),
            ("HIVECAT_UNIQUE_TABLE_LOCATION", " "),
        ]))
        .expect("config");

        assert_eq!(config.catalog_name, "lake");
        assert!(config.uses_system_security());
        assert!(config.delete_schema_locations_fallback);
        assert!(config.unique_table_location);
        assert_eq!(config.redirect_catalog.as_deref(), Some("hive"));
        assert_eq!(config.default_file_format, FileFormat::Orc);
        assert_eq!(config.materialized_view_retry.max_attempts, 3);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        for vars in [
            [("HIVECAT_SECURITY", "open")],
            [("HIVECAT_UNIQUE_TABLE_LOCATION", "maybe")],
            [("HIVECAT_MV_RETRY_MAX_ATTEMPTS", "ten")],
            [("HIVECAT_MV_RETRY_MAX_ATTEMPTS", "0")],
            [("HIVECAT_REDIRECT_CATALOG", "iceberg")],
        ] {
            let err = CatalogConfig::from_lookup(lookup(&vars)).expect_err("invalid");
            assert!(matches!(err, Error::InvalidInput(_)), "{err}");
        }
    }
}
