use crate::error::{MismatchKind, Result, ValidationError};
use log::info;
use std::collections::BTreeMap;
use verity_xml::{XmlDocument, path_name, root_namespaces};

/// Compares the namespaces declared on the received root element with `expected`.
/// Prefixes matter: the same URI bound to another prefix is a missing declaration.
pub fn validate_namespaces(
    received: &XmlDocument,
    expected: &BTreeMap<String, String>,
) -> Result<()> {
    info!("Start XML namespace validation");

    let found = root_namespaces(received);
    let root = received
        .document_element()
        .map(path_name)
        .unwrap_or_default();

    if found.len() != expected.len() {
        return Err(ValidationError::mismatch(
            MismatchKind::NamespaceCount,
            root,
            expected.len(),
            found.len(),
        ));
    }

    for (prefix, uri) in expected {
        match found.get(prefix) {
            Some(actual) if actual == uri => {
                info!("Validating namespace {} value as expected {} - value OK", prefix, uri);
            }
            Some(actual) => {
                return Err(ValidationError::mismatch(
                    MismatchKind::NamespaceValue,
                    format!("{}@xmlns:{}", root, prefix),
                    uri,
                    actual,
                ));
            }
            None => {
                return Err(ValidationError::mismatch(
                    MismatchKind::MissingNamespace,
                    root,
                    format!("{}={}", prefix, uri),
                    "",
                ));
            }
        }
    }

    info!("XML namespace validation finished successfully: All values OK");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECEIVED: &str = r#"<ns0:root xmlns="urn:default" xmlns:ns0="urn:zero"><child/></ns0:root>"#;

    fn expected(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(p, u)| (p.to_string(), u.to_string()))
            .collect()
    }

    fn check(pairs: &[(&str, &str)]) -> Option<MismatchKind> {
        let doc = XmlDocument::parse(RECEIVED).unwrap();
        validate_namespaces(&doc, &expected(pairs)).err().and_then(|e| e.kind())
    }

    #[test]
    fn test_matching_declarations() {
        assert_eq!(check(&[("", "urn:default"), ("ns0", "urn:zero")]), None);
    }

    #[test]
    fn test_count_mismatch() {
        assert_eq!(check(&[("ns0", "urn:zero")]), Some(MismatchKind::NamespaceCount));
    }

    #[test]
    fn test_missing_prefix_and_wrong_uri() {
        assert_eq!(
            check(&[("", "urn:default"), ("ns1", "urn:zero")]),
            Some(MismatchKind::MissingNamespace)
        );
        assert_eq!(
            check(&[("", "urn:default"), ("ns0", "urn:other")]),
            Some(MismatchKind::NamespaceValue)
        );
    }
}
