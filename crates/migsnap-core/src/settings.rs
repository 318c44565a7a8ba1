//! Runtime settings
//!
//! Settings come from three layers, later layers winning:
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. `MIGSNAP_*` environment variables

use crate::errors::{ExError, ExErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ledger unit under which migsnap records its own schema migrations.
pub const DEFAULT_BOOKKEEPING_UNIT: &str = "migsnap";

pub const ENV_BOOKKEEPING_UNIT: &str = "MIGSNAP_BOOKKEEPING_UNIT";
pub const ENV_ADMIN_ACTIONS: &str = "MIGSNAP_ADMIN_SNAPSHOT_ACTIONS";
pub const ENV_EXECUTOR: &str = "MIGSNAP_EXECUTOR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Ledger unit excluded from snapshots and fingerprints
    pub bookkeeping_unit: String,
    /// Whether checkout and delete commands are allowed
    pub admin_actions: bool,
    /// Program invoked to run schema transitions, if any
    pub executor_program: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bookkeeping_unit: DEFAULT_BOOKKEEPING_UNIT.to_string(),
            admin_actions: true,
            executor_program: None,
        }
    }
}

impl Settings {
    /// Load settings from an optional TOML file, then apply environment
    /// overrides from the process environment.
    ///
    /// # Errors
    ///
    /// - `Io`: the file could not be read
    /// - `Config`: the file is not valid TOML or an override is malformed
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p).map_err(|e| {
                    ExError::new(ExErrorKind::Io)
                        .with_op("settings_load")
                        .with_entity_id(p.display().to_string())
                        .with_message(e.to_string())
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Parse settings from TOML text; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// `Config` when the text is not valid TOML for this shape.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| {
            ExError::new(ExErrorKind::Config)
                .with_op("settings_parse")
                .with_message(e.to_string())
        })
    }

    /// Apply `MIGSNAP_*` overrides resolved through `lookup`.
    ///
    /// # Errors
    ///
    /// `Config` when a boolean override is not a recognised value, or the
    /// bookkeeping unit override is empty.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(unit) = lookup(ENV_BOOKKEEPING_UNIT) {
            if unit.trim().is_empty() {
                return Err(ExError::new(ExErrorKind::Config)
                    .with_op("settings_override")
                    .with_entity_id(ENV_BOOKKEEPING_UNIT)
                    .with_message("bookkeeping unit must not be empty"));
            }
            self.bookkeeping_unit = unit;
        }
        if let Some(flag) = lookup(ENV_ADMIN_ACTIONS) {
            self.admin_actions = parse_flag(ENV_ADMIN_ACTIONS, &flag)?;
        }
        if let Some(program) = lookup(ENV_EXECUTOR) {
            self.executor_program = Some(program).filter(|p| !p.trim().is_empty());
        }
        Ok(self)
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ExError::new(ExErrorKind::Config)
            .with_op("settings_override")
            .with_entity_id(key)
            .with_message(format!("expected a boolean, got '{}'", other))),
    }
}
