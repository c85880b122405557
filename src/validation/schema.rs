//! The seam to an external schema validator.
//!
//! The engine never parses schema definitions itself. A [`SchemaRepository`] maps the
//! namespace of a received root element to an [`XmlSchema`] that reports violations.

use crate::error::{Result, ValidationError};
use log::{error, info};
use std::collections::HashMap;
use verity_xml::XmlDocument;

pub trait XmlSchema: Send + Sync {
    /// Human-readable violations, empty when the document is valid.
    fn validate(&self, doc: &XmlDocument) -> Vec<String>;
}

pub trait SchemaRepository: Sync {
    fn schema_for_namespace(&self, uri: &str) -> Option<&dyn XmlSchema>;
}

/// Schemas registered in memory by target namespace.
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Box<dyn XmlSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, namespace: impl Into<String>, schema: Box<dyn XmlSchema>) {
        self.schemas.insert(namespace.into(), schema);
    }
}

impl SchemaRepository for SchemaRegistry {
    fn schema_for_namespace(&self, uri: &str) -> Option<&dyn XmlSchema> {
        self.schemas.get(uri).map(|s| s.as_ref())
    }
}

/// Validates `received` against the schema registered for its root namespace.
/// Documents whose root element has no namespace are not schema-validated.
pub fn validate_schema(received: &XmlDocument, repository: &dyn SchemaRepository) -> Result<()> {
    let Some(namespace) = received
        .document_element()
        .and_then(|root| root.namespace_uri())
        .filter(|ns| !ns.is_empty())
    else {
        return Ok(());
    };

    info!("Starting XML schema validation ...");

    let schema = repository.schema_for_namespace(namespace).ok_or_else(|| {
        ValidationError::Configuration(format!(
            "No schema found in schema repository for namespace '{}'",
            namespace
        ))
    })?;

    match schema.validate(received).into_iter().next() {
        None => {
            info!("Schema of received XML validated OK");
            Ok(())
        }
        Some(first) => {
            error!("Schema validation failed for namespace '{}'", namespace);
            Err(ValidationError::SchemaViolation(first))
        }
    }
}
