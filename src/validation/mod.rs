//! Message validator facades.
//!
//! [`XmlMessageValidator`] runs its stages in a fixed order: schema, namespace declarations,
//! payload comparison, path assertions, then headers when a control message is given.
//! [`JsonMessageValidator`] compares payloads only. Both stop at the first failure.

pub mod assertions;
pub mod headers;
pub mod json;
pub mod namespaces;
pub mod schema;
pub mod xml;

pub use assertions::assert_paths;
pub use headers::validate_headers;
pub use json::JsonComparator;
pub use namespaces::validate_namespaces;
pub use schema::{SchemaRegistry, SchemaRepository, XmlSchema, validate_schema};
pub use xml::XmlTreeComparator;

use crate::config::{JsonValidationConfig, XmlValidationConfig};
use crate::error::{Result, ValidationError};
use crate::ignore::IgnoreRules;
use crate::path::PathEvaluator;
use crate::resolver::DynamicContent;
use log::{debug, error, info, log_enabled};
use std::collections::BTreeMap;
use verity_xml::{NamespaceContext, ParseOptions, XmlDocument, to_pretty_string};

/// A message payload with its headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub payload: String,
    pub headers: BTreeMap<String, String>,
}

impl Message {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    fn has_payload(&self) -> bool {
        has_text(&self.payload)
    }
}

fn has_text(text: &str) -> bool {
    !text.trim().is_empty()
}

fn pretty(doc: &XmlDocument) -> String {
    to_pretty_string(doc).unwrap_or_else(|e| format!("<unprintable document: {}>", e))
}

/// Validates received XML messages. Holds only shared references, so one validator can
/// serve many concurrent calls.
pub struct XmlMessageValidator<'a> {
    resolver: &'a dyn DynamicContent,
    schemas: Option<&'a dyn SchemaRepository>,
}

impl<'a> XmlMessageValidator<'a> {
    pub fn new(resolver: &'a dyn DynamicContent) -> Self {
        Self {
            resolver,
            schemas: None,
        }
    }

    pub fn with_schema_repository(mut self, schemas: &'a dyn SchemaRepository) -> Self {
        self.schemas = Some(schemas);
        self
    }

    pub fn validate(
        &self,
        received: &Message,
        control: Option<&Message>,
        config: &XmlValidationConfig,
    ) -> Result<()> {
        info!("Start XML message validation");
        match self.run_stages(received, control, config) {
            Ok(()) => {
                info!("XML message validation successful: All values OK");
                Ok(())
            }
            Err(e) => {
                let payload = XmlDocument::parse(&received.payload)
                    .map(|doc| pretty(&doc))
                    .unwrap_or_else(|_| received.payload.clone());
                error!("Failed to validate:\n{}", payload);
                Err(e)
            }
        }
    }

    fn run_stages(
        &self,
        received: &Message,
        control: Option<&Message>,
        config: &XmlValidationConfig,
    ) -> Result<()> {
        let options = ParseOptions {
            strip_whitespace: config.strip_whitespace,
        };
        let received_doc = if received.has_payload() {
            Some(XmlDocument::parse_with(&received.payload, options)?)
        } else {
            None
        };

        if config.schema_validation {
            match (&received_doc, self.schemas) {
                (Some(doc), Some(schemas)) => validate_schema(doc, schemas)?,
                (Some(_), None) => {
                    debug!("No schema repository configured - skipped schema validation")
                }
                (None, _) => {}
            }
        }

        if !config.control_namespaces.is_empty() {
            let doc = received_doc.as_ref().ok_or_else(|| {
                ValidationError::EmptyPayloadMismatch(
                    "Unable to validate message namespaces - received message payload was empty"
                        .to_string(),
                )
            })?;
            validate_namespaces(doc, &config.control_namespaces)?;
        }

        match &received_doc {
            Some(doc) => {
                let namespaces = NamespaceContext::build(doc, &config.namespaces);
                let evaluator = PathEvaluator::new(doc, &namespaces);
                let rules = IgnoreRules::new(&evaluator, &config.ignore_expressions)?;

                self.validate_payload(doc, &rules, control, config)?;
                if !config.path_assertions.is_empty() {
                    assert_paths(&evaluator, &rules, &config.path_assertions, self.resolver)?;
                }
            }
            None => {
                self.validate_empty_payload(control)?;
                if !config.path_assertions.is_empty() {
                    return Err(ValidationError::EmptyPayloadMismatch(
                        "Unable to validate message elements - received message payload was empty"
                            .to_string(),
                    ));
                }
            }
        }

        if let Some(control) = control {
            validate_headers(
                &control.headers,
                &received.headers,
                self.resolver,
                &config.placeholder,
            )?;
        }
        Ok(())
    }

    fn validate_payload(
        &self,
        received: &XmlDocument,
        rules: &IgnoreRules,
        control: Option<&Message>,
        config: &XmlValidationConfig,
    ) -> Result<()> {
        let Some(control) = control else {
            info!("Skip message payload validation as no control message was defined");
            return Ok(());
        };
        let control_text = self.resolver.replace_dynamic_content(&control.payload)?;
        if !has_text(&control_text) {
            return Ok(());
        }

        info!("Start XML tree validation ...");
        let control_doc = XmlDocument::parse_with(
            &control_text,
            ParseOptions {
                strip_whitespace: config.strip_whitespace,
            },
        )?;
        if log_enabled!(log::Level::Debug) {
            debug!("Received message:\n{}", pretty(received));
            debug!("Control message:\n{}", pretty(&control_doc));
        }

        XmlTreeComparator::new(rules, &config.placeholder).compare(received, &control_doc)?;
        info!("XML tree validation finished successfully: All values OK");
        Ok(())
    }

    fn validate_empty_payload(&self, control: Option<&Message>) -> Result<()> {
        let Some(control) = control else {
            info!("Skip message payload validation as no control message was defined");
            return Ok(());
        };
        let control_text = self.resolver.replace_dynamic_content(&control.payload)?;
        if has_text(&control_text) {
            return Err(ValidationError::EmptyPayloadMismatch(
                "Unable to validate message payload - received message payload was empty, \
                 control message payload is not"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Validates received JSON messages.
pub struct JsonMessageValidator<'a> {
    resolver: &'a dyn DynamicContent,
}

impl<'a> JsonMessageValidator<'a> {
    pub fn new(resolver: &'a dyn DynamicContent) -> Self {
        Self { resolver }
    }

    pub fn validate(
        &self,
        received: &Message,
        control: Option<&Message>,
        config: &JsonValidationConfig,
    ) -> Result<()> {
        let Some(control) = control else {
            info!("Skip JSON message validation as no control message was defined");
            return Ok(());
        };
        info!("Start JSON message validation");
        debug!("Received message:\n{}", received.payload);
        debug!("Control message:\n{}", control.payload);

        let result = self.compare_payloads(received, control, config);
        match &result {
            Ok(()) => info!("JSON message validation finished successfully: All values OK"),
            Err(_) => error!("Failed to validate JSON text:\n{}", received.payload),
        }
        result
    }

    fn compare_payloads(
        &self,
        received: &Message,
        control: &Message,
        config: &JsonValidationConfig,
    ) -> Result<()> {
        let control_text = self.resolver.replace_dynamic_content(&control.payload)?;

        if !has_text(&control_text) {
            if received.has_payload() {
                return Err(ValidationError::EmptyPayloadMismatch(format!(
                    "expected empty message content, but was: {}",
                    received.payload
                )));
            }
            return Ok(());
        }
        if !received.has_payload() {
            return Err(ValidationError::EmptyPayloadMismatch(
                "expected message contents, but received empty message".to_string(),
            ));
        }

        let received_json: serde_json::Value = serde_json::from_str(&received.payload)?;
        let control_json: serde_json::Value = serde_json::from_str(&control_text)?;
        JsonComparator::new(&config.placeholder).compare(&received_json, &control_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MismatchKind;
    use crate::resolver::Bindings;

    #[test]
    fn test_xml_empty_payload_rules() {
        let bindings = Bindings::new();
        let validator = XmlMessageValidator::new(&bindings);
        let config = XmlValidationConfig::default();
        let empty = Message::new("  ");
        let full = Message::new("<a/>");

        assert!(validator.validate(&empty, None, &config).is_ok());
        assert!(validator.validate(&empty, Some(&empty), &config).is_ok());
        assert!(validator.validate(&full, Some(&empty), &config).is_ok());
        assert!(matches!(
            validator.validate(&empty, Some(&full), &config),
            Err(ValidationError::EmptyPayloadMismatch(_))
        ));
        let with_assertion = config.clone().with_path_assertion("//a", None);
        assert!(matches!(
            validator.validate(&empty, None, &with_assertion),
            Err(ValidationError::EmptyPayloadMismatch(_))
        ));
    }

    #[test]
    fn test_control_payload_dynamic_content_is_replaced() {
        let bindings = Bindings::new().with_variable("id", "7");
        let validator = XmlMessageValidator::new(&bindings);
        let received = Message::new("<msg><id>7</id></msg>");
        let control = Message::new("<msg><id>${id}</id></msg>");
        assert!(validator
            .validate(&received, Some(&control), &XmlValidationConfig::default())
            .is_ok());
    }

    #[test]
    fn test_headers_are_checked_after_payload() {
        let bindings = Bindings::new();
        let validator = XmlMessageValidator::new(&bindings);
        let received = Message::new("<a/>").with_header("op", "x");
        let control = Message::new("<a/>").with_header("op", "y");
        let err = validator
            .validate(&received, Some(&control), &XmlValidationConfig::default())
            .unwrap_err();
        assert_eq!(err.kind(), Some(MismatchKind::HeaderValue));
    }

    #[test]
    fn test_json_empty_payload_rules() {
        let bindings = Bindings::new();
        let validator = JsonMessageValidator::new(&bindings);
        let config = JsonValidationConfig::default();
        let empty = Message::new("");
        let full = Message::new(r#"{"a":1}"#);

        assert!(validator.validate(&empty, Some(&empty), &config).is_ok());
        assert!(matches!(
            validator.validate(&full, Some(&empty), &config),
            Err(ValidationError::EmptyPayloadMismatch(_))
        ));
        assert!(matches!(
            validator.validate(&empty, Some(&full), &config),
            Err(ValidationError::EmptyPayloadMismatch(_))
        ));
        assert!(matches!(
            validator.validate(&Message::new("{"), Some(&full), &config),
            Err(ValidationError::JsonParse(_))
        ));
    }

    struct RootMustBeVersioned;

    impl XmlSchema for RootMustBeVersioned {
        fn validate(&self, doc: &XmlDocument) -> Vec<String> {
            match doc.document_element() {
                Some(root) if root.attribute("version", None).is_some() => Vec::new(),
                _ => vec!["attribute 'version' is required".to_string()],
            }
        }
    }

    #[test]
    fn test_one_validator_serves_concurrent_calls() {
        let bindings = Bindings::new().with_variable("id", "7");
        let mut registry = SchemaRegistry::new();
        registry.register("urn:msg", Box::new(RootMustBeVersioned));
        let xml = XmlMessageValidator::new(&bindings).with_schema_repository(&registry);
        let json = JsonMessageValidator::new(&bindings);
        let xml_config = XmlValidationConfig::default()
            .with_namespace("m", "urn:msg")
            .with_path_assertion("//m:id", Some("${id}"));
        let json_config = JsonValidationConfig::default();

        let valid = Message::new(r#"<msg xmlns="urn:msg" version="1"><id>7</id></msg>"#);
        let unversioned = Message::new(r#"<msg xmlns="urn:msg"><id>7</id></msg>"#);
        let received_json = Message::new(r#"{"id":"7"}"#);
        let control_json = Message::new(r#"{"id":"${id}"}"#);

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    s.spawn(|| {
                        let ok = xml.validate(&valid, None, &xml_config).is_ok();
                        let rejected = matches!(
                            xml.validate(&unversioned, None, &xml_config),
                            Err(ValidationError::SchemaViolation(_))
                        );
                        let json_ok = json
                            .validate(&received_json, Some(&control_json), &json_config)
                            .is_ok();
                        ok && rejected && json_ok
                    })
                })
                .collect();
            for handle in handles {
                assert!(handle.join().unwrap());
            }
        });
    }
}
