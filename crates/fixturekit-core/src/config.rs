//! Factory configuration.
//!
//! Controls the shape of rendered documents: REST vs JSON-API, how attribute
//! keys are transformed, how polymorphic type stubs are spelled, and where id
//! counters start.
//!
//! # Environment Variables
//!
//! - `FIXTUREKIT_STYLE=rest|json-api` - Document style
//! - `FIXTUREKIT_KEY_STYLE=as-is|camel|underscore|dasherize` - Attribute key style
//!
//! A config can also be read from JSON with [`FactoryConfig::from_json`];
//! missing keys keep their defaults.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, Error, Result};
use crate::inflect;

/// Shape of rendered documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentStyle {
    /// `{ user: {...}, companies: [...] }`
    #[default]
    Rest,
    /// `{ data: {...}, included: [...] }`
    JsonApi,
}

impl FromStr for DocumentStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "json-api" | "jsonapi" | "json_api" => Ok(Self::JsonApi),
            other => Err(config_error(format!("unknown document style '{other}'"))),
        }
    }
}

/// Transform applied to field names when rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyStyle {
    #[default]
    AsIs,
    Camel,
    Underscore,
    Dasherize,
}

impl KeyStyle {
    /// Apply this style to `key`.
    pub fn apply(self, key: &str) -> String {
        match self {
            KeyStyle::AsIs => key.to_string(),
            KeyStyle::Camel => inflect::camelize(key),
            KeyStyle::Underscore => inflect::underscore(key),
            KeyStyle::Dasherize => inflect::dasherize(key),
        }
    }
}

impl FromStr for KeyStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "as-is" | "asis" | "none" => Ok(Self::AsIs),
            "camel" | "camelize" => Ok(Self::Camel),
            "underscore" | "snake" => Ok(Self::Underscore),
            "dasherize" | "dash" | "kebab" => Ok(Self::Dasherize),
            other => Err(config_error(format!("unknown key style '{other}'"))),
        }
    }
}

fn config_error(message: String) -> Error {
    Error::Config(ConfigError {
        message,
        source: None,
    })
}

/// Factory configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FactoryConfig {
    /// Document style produced by `unwrap`
    pub style: DocumentStyle,
    /// Attribute/relationship key transform
    pub attribute_keys: KeyStyle,
    /// Spelling of polymorphic type discriminators (`big_hat`)
    pub type_keys: KeyStyle,
    /// First value handed out by id counters
    pub id_start: u64,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            style: DocumentStyle::Rest,
            attribute_keys: KeyStyle::AsIs,
            type_keys: KeyStyle::Underscore,
            id_start: 1,
        }
    }
}

impl FactoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read a config object such as `{"style": "json-api", "idStart": 100}`.
    pub fn from_json(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| {
            Error::Config(ConfigError {
                message: format!("invalid factory config: {e}"),
                source: Some(Box::new(e)),
            })
        })
    }

    /// Read overrides through `lookup` (environment-like).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(style) = lookup("FIXTUREKIT_STYLE") {
            config.style = style.parse()?;
        }
        if let Some(keys) = lookup("FIXTUREKIT_KEY_STYLE") {
            config.attribute_keys = keys.parse()?;
        }
        Ok(config)
    }

    /// Set the document style.
    pub fn style(mut self, style: DocumentStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the attribute key style.
    pub fn attribute_keys(mut self, style: KeyStyle) -> Self {
        self.attribute_keys = style;
        self
    }

    /// Set the polymorphic type-key style.
    pub fn type_keys(mut self, style: KeyStyle) -> Self {
        self.type_keys = style;
        self
    }

    /// Set the first id handed out per type.
    pub fn id_start(mut self, start: u64) -> Self {
        self.id_start = start;
        self
    }
}
