// src/error.rs
use crate::resolver::ResolveError;
use std::fmt;
use thiserror::Error;
use verity_xml::XmlError;
use verity_xpath::XPathError;

/// The specific disagreement behind a [`ValidationError::StructuralMismatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    ElementName,
    ElementNamespace,
    NodeType,
    AttributeCount,
    UnknownAttribute,
    AttributeValue,
    ChildCount,
    NodeValue,
    EntryCount,
    MissingEntry,
    EntryType,
    ArraySize,
    Value,
    NamespaceCount,
    MissingNamespace,
    NamespaceValue,
    MissingHeader,
    HeaderValue,
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phrase = match self {
            MismatchKind::ElementName => "Element names not equal",
            MismatchKind::ElementNamespace => "Element namespace not equal",
            MismatchKind::NodeType => "Node types not equal",
            MismatchKind::AttributeCount => "Number of attributes not equal",
            MismatchKind::UnknownAttribute => "Attribute not present in control message",
            MismatchKind::AttributeValue => "Attribute values not equal",
            MismatchKind::ChildCount => "Number of child elements not equal",
            MismatchKind::NodeValue => "Node values not equal",
            MismatchKind::EntryCount => "Number of JSON entries not equal",
            MismatchKind::MissingEntry => "Missing JSON entry",
            MismatchKind::EntryType => "JSON entry types not equal",
            MismatchKind::ArraySize => "JSON array size not equal",
            MismatchKind::Value => "Values not equal",
            MismatchKind::NamespaceCount => "Number of namespace declarations not equal",
            MismatchKind::MissingNamespace => "Missing namespace declaration",
            MismatchKind::NamespaceValue => "Namespace URIs not equal",
            MismatchKind::MissingHeader => "Missing message header",
            MismatchKind::HeaderValue => "Header values not equal",
        };
        f.write_str(phrase)
    }
}

/// The outcome of a failed validation.
///
/// The first four variants mean the received message is wrong; the rest mean the engine
/// could not process the input. See [`ValidationError::is_mismatch`].
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{kind} for '{path}', expected '{expected}' but was '{actual}'")]
    StructuralMismatch {
        kind: MismatchKind,
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Element not found: '{0}'")]
    UnknownElement(String),

    #[error("Empty payload mismatch: {0}")]
    EmptyPayloadMismatch(String),

    #[error("Schema validation failed: {0}")]
    SchemaViolation(String),

    #[error("Invalid validation configuration: {0}")]
    Configuration(String),

    #[error("Failed to process XML: {0}")]
    Xml(#[from] XmlError),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Internal validation error: {0}")]
    Internal(String),
}

impl ValidationError {
    pub fn mismatch(
        kind: MismatchKind,
        path: impl Into<String>,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        ValidationError::StructuralMismatch {
            kind,
            path: path.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// True when the received message disagrees with what was expected, as opposed to the
    /// engine failing to process its input.
    pub fn is_mismatch(&self) -> bool {
        matches!(
            self,
            ValidationError::StructuralMismatch { .. }
                | ValidationError::UnknownElement(_)
                | ValidationError::EmptyPayloadMismatch(_)
                | ValidationError::SchemaViolation(_)
        )
    }

    /// The mismatch kind, for structural mismatches.
    pub fn kind(&self) -> Option<MismatchKind> {
        match self {
            ValidationError::StructuralMismatch { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<XPathError> for ValidationError {
    fn from(e: XPathError) -> Self {
        ValidationError::Configuration(e.to_string())
    }
}

impl From<ResolveError> for ValidationError {
    fn from(e: ResolveError) -> Self {
        ValidationError::Configuration(e.to_string())
    }
}

pub type Result<T, E = ValidationError> = std::result::Result<T, E>;
