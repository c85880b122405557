//! Namespace contexts for path expression evaluation.

use crate::document::XmlDocument;
use std::collections::BTreeMap;
use verity_xpath::NamespaceResolver;

/// The namespaces declared on the document element, keyed by prefix.
/// The default namespace is keyed by the empty string.
pub fn root_namespaces(doc: &XmlDocument) -> BTreeMap<String, String> {
    doc.document_element()
        .map(|root| {
            root.declared_namespaces()
                .iter()
                .map(|ns| (ns.prefix.clone().unwrap_or_default(), ns.uri.clone()))
                .collect()
        })
        .unwrap_or_default()
}

/// Prefix bindings used to evaluate path expressions against one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceContext {
    bindings: BTreeMap<String, String>,
}

impl NamespaceContext {
    /// Starts from the root element's declarations and applies `configured` on top, so a
    /// configured binding replaces a declared one with the same prefix.
    pub fn build(doc: &XmlDocument, configured: &BTreeMap<String, String>) -> Self {
        let mut bindings = root_namespaces(doc);
        for (prefix, uri) in configured {
            if let Some(previous) = bindings.insert(prefix.clone(), uri.clone()) {
                if previous != *uri {
                    log::debug!(
                        "Configured namespace '{}' for prefix '{}' replaces '{}'",
                        uri,
                        prefix,
                        previous
                    );
                }
            }
        }
        Self { bindings }
    }

    pub fn bindings(&self) -> &BTreeMap<String, String> {
        &self.bindings
    }
}

impl NamespaceResolver for NamespaceContext {
    fn resolve_prefix(&self, prefix: &str) -> Option<&str> {
        self.bindings.get(prefix).map(String::as_str)
    }
}
