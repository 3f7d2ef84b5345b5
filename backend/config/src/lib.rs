//! `herald-config`: runtime configuration for the herald command router.
//!
//! Provides:
//! - Typed config schema (router behaviour, cooldown presets, logging, console identity)
//! - YAML read/write with rolling backups
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation with errors and warnings

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, write_config};
pub use schema::{
    ConsoleConfig, CooldownPreset, CooldownScopeKind, HeraldConfig, LoggingConfig, RouterSettings,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use std::path::Path;

/// Load, substitute env vars, apply defaults, and validate a config file.
///
/// Validation findings are logged; the returned report lets the caller decide
/// whether errors are fatal.
pub async fn load_and_prepare(path: &Path) -> Result<(HeraldConfig, ValidationReport)> {
    let raw_config = load_config(path).await?;

    let value = serde_json::to_value(&raw_config)
        .context("Failed to serialize config for env substitution")?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    let config: HeraldConfig = serde_json::from_value(value)
        .context("Failed to deserialize config after env substitution")?;

    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }

    Ok((config, report))
}
