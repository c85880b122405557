//! Validation configuration.
//!
//! Every struct deserializes from camelCase JSON with all fields optional, and offers
//! builder-style `with_*` methods for programmatic use.

use crate::error::{Result, ValidationError};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// The reserved expected value meaning "accept whatever was received".
pub const DEFAULT_PLACEHOLDER: &str = "@ignore@";

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct XmlValidationConfig {
    /// Full dotted paths, short names or path expressions of nodes to skip.
    pub ignore_expressions: BTreeSet<String>,
    /// Prefix bindings for path expressions.
    pub namespaces: BTreeMap<String, String>,
    /// Namespace declarations the received root element must carry, keyed by prefix.
    /// The default namespace is keyed by the empty string.
    pub control_namespaces: BTreeMap<String, String>,
    /// Path expressions and their expected values. `None` expects no value.
    pub path_assertions: BTreeMap<String, Option<String>>,
    pub schema_validation: bool,
    pub strip_whitespace: bool,
    pub placeholder: String,
}

impl Default for XmlValidationConfig {
    fn default() -> Self {
        Self {
            ignore_expressions: BTreeSet::new(),
            namespaces: BTreeMap::new(),
            control_namespaces: BTreeMap::new(),
            path_assertions: BTreeMap::new(),
            schema_validation: true,
            strip_whitespace: true,
            placeholder: default_placeholder(),
        }
    }
}

impl XmlValidationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ignore_expression(mut self, expression: impl Into<String>) -> Self {
        self.ignore_expressions.insert(expression.into());
        self
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }

    pub fn with_control_namespace(
        mut self,
        prefix: impl Into<String>,
        uri: impl Into<String>,
    ) -> Self {
        self.control_namespaces.insert(prefix.into(), uri.into());
        self
    }

    pub fn with_path_assertion(
        mut self,
        expression: impl Into<String>,
        expected: Option<&str>,
    ) -> Self {
        self.path_assertions
            .insert(expression.into(), expected.map(str::to_string));
        self
    }

    pub fn with_schema_validation(mut self, enabled: bool) -> Self {
        self.schema_validation = enabled;
        self
    }

    pub fn with_strip_whitespace(mut self, enabled: bool) -> Self {
        self.strip_whitespace = enabled;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JsonValidationConfig {
    pub placeholder: String,
}

impl Default for JsonValidationConfig {
    fn default() -> Self {
        Self {
            placeholder: default_placeholder(),
        }
    }
}

impl JsonValidationConfig {
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }
}

/// Everything the command line needs for one validation run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidatorConfig {
    pub xml: XmlValidationConfig,
    pub json: JsonValidationConfig,
    pub variables: BTreeMap<String, String>,
}

impl ValidatorConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| ValidationError::Configuration(format!("Invalid configuration: {}", e)))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let text = fs::read_to_string(path_ref).map_err(|e| {
            ValidationError::Configuration(format!(
                "Failed to read configuration from '{}': {}",
                path_ref.display(),
                e
            ))
        })?;
        Self::from_json_str(&text)
    }
}
