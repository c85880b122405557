//! Decides which received nodes are excluded from comparison.
//!
//! An ignore expression matches a node in one of three ways, tried in this order:
//! 1. the expression equals the node's full dotted path name;
//! 2. the expression, read as a short name, locates exactly this node;
//! 3. the expression is a path expression whose first selected node is this node.
//!
//! Short names locate only the first matching node in document order, so a short name can
//! never ignore a later node that shares it. Attributes use the same rules with
//! `<element path>.<attribute name>` as their path name.

use crate::error::Result;
use crate::path::{PathEvaluator, is_path_expression};
use std::collections::{BTreeSet, HashSet};
use verity_xml::{NodeHandle, XmlNode, find_node_by_name, path_name};

/// Ignore rules resolved against one received document.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    expressions: BTreeSet<String>,
    by_short_name: HashSet<NodeHandle>,
    by_path_expression: HashSet<NodeHandle>,
}

impl IgnoreRules {
    /// Resolves every expression against the evaluator's document up front. A malformed path
    /// expression is a configuration error.
    pub fn new(evaluator: &PathEvaluator<'_>, expressions: &BTreeSet<String>) -> Result<Self> {
        let mut rules = IgnoreRules {
            expressions: expressions.clone(),
            ..Default::default()
        };
        for expression in expressions {
            if let Some(node) = find_node_by_name(evaluator.document(), expression) {
                rules.by_short_name.insert(node.handle());
            }
            if is_path_expression(expression) {
                match evaluator.select_node(expression)?.node() {
                    Some(node) => {
                        rules.by_path_expression.insert(node.handle());
                    }
                    None => log::debug!("Ignore expression '{}' selects no node", expression),
                }
            }
        }
        Ok(rules)
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    /// Whether `node`, an element or attribute of the received document, is ignored.
    pub fn is_ignored(&self, node: XmlNode<'_>) -> bool {
        if self.is_empty() {
            return false;
        }
        self.expressions.contains(&path_name(node))
            || self.by_short_name.contains(&node.handle())
            || self.by_path_expression.contains(&node.handle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use std::collections::BTreeMap;
    use verity_xml::{NamespaceContext, XmlDocument};

    const NUMBERS: &str = r#"<Root xmlns:n="urn:n">
        <Numbers1><NumberItem code="1"><AreaCode>030</AreaCode></NumberItem></Numbers1>
        <Numbers2><NumberItem code="2"><AreaCode>040</AreaCode></NumberItem></Numbers2>
        <n:Extra>x</n:Extra>
    </Root>"#;

    fn rules_for(doc: &XmlDocument, expressions: &[&str]) -> Result<IgnoreRules> {
        let namespaces = NamespaceContext::build(doc, &BTreeMap::new());
        let evaluator = PathEvaluator::new(doc, &namespaces);
        let set = expressions.iter().map(|s| s.to_string()).collect();
        IgnoreRules::new(&evaluator, &set)
    }

    fn area_codes(doc: &XmlDocument) -> Vec<XmlNode<'_>> {
        doc.elements()
            .filter(|e| e.local_name() == Some("AreaCode"))
            .collect()
    }

    #[test]
    fn test_full_path_matches_only_that_path() {
        let doc = XmlDocument::parse(NUMBERS).unwrap();
        let rules = rules_for(&doc, &["Root.Numbers2.NumberItem.AreaCode"]).unwrap();
        let codes = area_codes(&doc);
        assert!(!rules.is_ignored(codes[0]));
        assert!(rules.is_ignored(codes[1]));
    }

    #[test]
    fn test_short_name_matches_first_in_document_order() {
        let doc = XmlDocument::parse(NUMBERS).unwrap();
        let rules = rules_for(&doc, &["AreaCode"]).unwrap();
        let codes = area_codes(&doc);
        assert!(rules.is_ignored(codes[0]));
        assert!(!rules.is_ignored(codes[1]));
    }

    #[test]
    fn test_path_expression_matches_selected_node() {
        let doc = XmlDocument::parse(NUMBERS).unwrap();
        let rules = rules_for(&doc, &["//Numbers2/NumberItem/AreaCode", "//n:Extra"]).unwrap();
        let codes = area_codes(&doc);
        assert!(!rules.is_ignored(codes[0]));
        assert!(rules.is_ignored(codes[1]));
        // Unprefixed path names ignore namespaces; prefixed path expressions use them.
        let extra = doc.elements().find(|e| e.local_name() == Some("Extra")).unwrap();
        assert!(rules.is_ignored(extra));
    }

    #[test]
    fn test_attribute_rules() {
        let doc = XmlDocument::parse(NUMBERS).unwrap();
        let items: Vec<XmlNode<'_>> = doc
            .elements()
            .filter(|e| e.local_name() == Some("NumberItem"))
            .collect();
        let first = items[0].attribute("code", None).unwrap();
        let second = items[1].attribute("code", None).unwrap();

        let by_path = rules_for(&doc, &["Root.Numbers2.NumberItem.code"]).unwrap();
        assert!(!by_path.is_ignored(first));
        assert!(by_path.is_ignored(second));

        let by_short_name = rules_for(&doc, &["NumberItem.code"]).unwrap();
        assert!(by_short_name.is_ignored(first));
        assert!(!by_short_name.is_ignored(second));

        let by_expression = rules_for(&doc, &["//Numbers2//@code"]).unwrap();
        assert!(by_expression.is_ignored(second));
        assert!(!by_expression.is_ignored(first));
    }

    #[test]
    fn test_malformed_path_expression_is_a_configuration_error() {
        let doc = XmlDocument::parse(NUMBERS).unwrap();
        assert!(matches!(
            rules_for(&doc, &["//NumberItem["]),
            Err(ValidationError::Configuration(_))
        ));
    }

    #[test]
    fn test_no_rules_ignore_nothing() {
        let doc = XmlDocument::parse(NUMBERS).unwrap();
        let rules = rules_for(&doc, &[]).unwrap();
        assert!(rules.is_empty());
        assert!(!rules.is_ignored(doc.document_element().unwrap()));
    }
}
