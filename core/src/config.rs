//! Typed session configuration.
//!
//! Session properties are plain `key -> value` strings on the wire. The
//! client reads a handful of them with a fixed type and default through
//! [`ConfigOption`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised while interpreting a session property.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("could not parse value '{value}' for key '{key}', expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// A value type that can be read from a property string.
pub trait ConfigValue: Sized + Clone {
    /// Description of the accepted values, used in error messages.
    const EXPECTED: &'static str;

    fn parse_value(raw: &str) -> Option<Self>;
}

impl ConfigValue for bool {
    const EXPECTED: &'static str = "'true' or 'false'";

    fn parse_value(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }
}

impl ConfigValue for usize {
    const EXPECTED: &'static str = "a non-negative integer";

    fn parse_value(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

/// A typed, defaulted session property.
#[derive(Debug, Clone, Copy)]
pub struct ConfigOption<T: 'static> {
    pub key: &'static str,
    pub default: T,
}

impl<T: ConfigValue> ConfigOption<T> {
    pub const fn new(key: &'static str, default: T) -> Self {
        Self { key, default }
    }

    /// Check that `raw` is acceptable for this option.
    pub fn validate(&self, raw: &str) -> Result<T, ConfigError> {
        T::parse_value(raw).ok_or_else(|| ConfigError::InvalidValue {
            key: self.key.to_string(),
            value: raw.to_string(),
            expected: T::EXPECTED,
        })
    }
}

/// How query results are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultMode {
    /// Materialized, paged table view.
    Table,
    /// Continuous changelog view.
    Changelog,
    /// Append-only printing straight to the terminal.
    Tableau,
}

impl ResultMode {
    pub fn name(self) -> &'static str {
        match self {
            ResultMode::Table => "TABLE",
            ResultMode::Changelog => "CHANGELOG",
            ResultMode::Tableau => "TABLEAU",
        }
    }
}

impl fmt::Display for ResultMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResultMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(ResultMode::Table),
            "changelog" => Ok(ResultMode::Changelog),
            "tableau" => Ok(ResultMode::Tableau),
            _ => Err(()),
        }
    }
}

impl ConfigValue for ResultMode {
    const EXPECTED: &'static str = "one of 'table', 'changelog', 'tableau'";

    fn parse_value(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

/// Whether queries run unbounded (streaming) or bounded (batch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    Streaming,
    Batch,
}

impl ConfigValue for RuntimeMode {
    const EXPECTED: &'static str = "one of 'streaming', 'batch'";

    fn parse_value(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "streaming" => Some(RuntimeMode::Streaming),
            "batch" => Some(RuntimeMode::Batch),
            _ => None,
        }
    }
}

pub const RESULT_MODE: ConfigOption<ResultMode> =
    ConfigOption::new("sql-client.execution.result-mode", ResultMode::Table);

pub const DML_SYNC: ConfigOption<bool> = ConfigOption::new("table.dml-sync", false);

pub const VERBOSE: ConfigOption<bool> = ConfigOption::new("sql-client.verbose", false);

pub const RUNTIME_MODE: ConfigOption<RuntimeMode> =
    ConfigOption::new("execution.runtime-mode", RuntimeMode::Streaming);

pub const MAX_COLUMN_WIDTH: ConfigOption<usize> =
    ConfigOption::new("sql-client.display.max-column-width", 30);

/// Validate a property against the known typed options.
///
/// Unknown keys are accepted as-is; they belong to the gateway.
pub fn validate_property(key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        k if k == RESULT_MODE.key => RESULT_MODE.validate(value).map(|_| ()),
        k if k == DML_SYNC.key => DML_SYNC.validate(value).map(|_| ()),
        k if k == VERBOSE.key => VERBOSE.validate(value).map(|_| ()),
        k if k == RUNTIME_MODE.key => RUNTIME_MODE.validate(value).map(|_| ()),
        k if k == MAX_COLUMN_WIDTH.key => MAX_COLUMN_WIDTH.validate(value).map(|_| ()),
        _ => Ok(()),
    }
}

/// A snapshot of the effective session properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    properties: HashMap<String, String>,
}

impl SessionConfig {
    pub fn new(properties: HashMap<String, String>) -> Self {
        Self { properties }
    }

    /// Read a typed option, falling back to its default when the key is
    /// missing or unparsable.
    pub fn get<T: ConfigValue>(&self, option: &ConfigOption<T>) -> T {
        self.properties
            .get(option.key)
            .and_then(|raw| T::parse_value(raw))
            .unwrap_or_else(|| option.default.clone())
    }

    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }
}

impl From<HashMap<String, String>> for SessionConfig {
    fn from(properties: HashMap<String, String>) -> Self {
        Self::new(properties)
    }
}
