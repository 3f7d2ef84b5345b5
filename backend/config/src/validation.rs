//! Config validation with field paths in every finding.

use crate::schema::HeraldConfig;
use thiserror::Error;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &HeraldConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_router(config, &mut report);
    validate_cooldowns(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_router(config: &HeraldConfig, report: &mut ValidationReport) {
    let router = &config.router;
    for (i, prefix) in router.prefixes.iter().enumerate() {
        let path = format!("router.prefixes[{i}]");
        if prefix.is_empty() {
            report.error(&path, "Prefix cannot be empty");
        } else if prefix.contains(' ') {
            report.error(&path, "Prefix cannot contain spaces");
        }
    }
    if router.prefixes.is_empty() && router.mention_prefix == Some(false) {
        report.warn(
            "router",
            "No prefixes and mention prefix disabled; every message is treated as a command",
        );
    }
}

fn validate_cooldowns(config: &HeraldConfig, report: &mut ValidationReport) {
    for (name, preset) in &config.cooldowns {
        let path = format!("cooldowns.{name}");
        if name.trim().is_empty() {
            report.error("cooldowns", "Cooldown name cannot be empty");
        }
        if preset.max_runs == 0 {
            report.error(format!("{path}.maxRuns"), "maxRuns must be >= 1");
        }
        if preset.usage_expires_secs == 0 {
            report.error(format!("{path}.usageExpiresSecs"), "usageExpiresSecs must be > 0");
        }
    }

    if let Some(global) = &config.global_cooldown {
        if !config.cooldowns.contains_key(global) {
            report.error(
                "globalCooldown",
                format!("References unknown cooldown preset \"{global}\""),
            );
        }
    }
}

fn validate_logging(config: &HeraldConfig, report: &mut ValidationReport) {
    if let Some(level) = &config.logging.level {
        if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            report.warn(
                "logging.level",
                format!("Unknown level \"{level}\"; expected one of {}", LOG_LEVELS.join(", ")),
            );
        }
    }
}
