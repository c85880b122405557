//! Positional tree comparison of a received XML document against a control document.

use crate::error::{MismatchKind, Result, ValidationError};
use crate::ignore::IgnoreRules;
use log::{debug, info};
use verity_xml::{NodeKind, XmlDocument, XmlNode, path_name};

/// Walks two documents together and fails on the first disagreement.
pub struct XmlTreeComparator<'a> {
    rules: &'a IgnoreRules,
    placeholder: &'a str,
}

impl<'a> XmlTreeComparator<'a> {
    /// `rules` must have been resolved against the received document.
    pub fn new(rules: &'a IgnoreRules, placeholder: &'a str) -> Self {
        Self { rules, placeholder }
    }

    pub fn compare(&self, received: &XmlDocument, control: &XmlDocument) -> Result<()> {
        self.compare_nodes(received.root(), control.root())
    }

    fn compare_nodes(&self, received: XmlNode<'_>, control: XmlNode<'_>) -> Result<()> {
        match received.kind() {
            NodeKind::Comment => {
                info!("Ignored comment node ({})", received.value().unwrap_or_default());
                return Ok(());
            }
            NodeKind::ProcessingInstruction => {
                info!(
                    "Ignored processing instruction ({}={})",
                    received.local_name().unwrap_or_default(),
                    received.value().unwrap_or_default()
                );
                return Ok(());
            }
            NodeKind::Attribute => {
                return Err(ValidationError::Internal(format!(
                    "Attribute '{}' reached outside its element's attribute set",
                    path_name(received)
                )));
            }
            _ => {}
        }

        if received.kind() != control.kind() {
            return Err(ValidationError::mismatch(
                MismatchKind::NodeType,
                path_name(received),
                format!("{:?}", control.kind()),
                format!("{:?}", received.kind()),
            ));
        }

        match received.kind() {
            NodeKind::Document => {
                match (
                    received.document().document_element(),
                    control.document().document_element(),
                ) {
                    (Some(r), Some(c)) => self.compare_nodes(r, c),
                    (None, None) => Ok(()),
                    (r, c) => Err(ValidationError::mismatch(
                        MismatchKind::ChildCount,
                        "",
                        usize::from(c.is_some()),
                        usize::from(r.is_some()),
                    )),
                }
            }
            NodeKind::Element => self.compare_elements(received, control),
            _ => self.compare_text(received, control),
        }
    }

    fn compare_elements(&self, received: XmlNode<'_>, control: XmlNode<'_>) -> Result<()> {
        let name = received.local_name().unwrap_or_default();
        let path = path_name(received);
        debug!(
            "Validating element: {} ({})",
            name,
            received.namespace_uri().unwrap_or("null")
        );

        let expected_name = control.local_name().unwrap_or_default();
        if name != expected_name {
            return Err(ValidationError::mismatch(
                MismatchKind::ElementName,
                path,
                expected_name,
                name,
            ));
        }
        if received.namespace_uri() != control.namespace_uri() {
            return Err(ValidationError::mismatch(
                MismatchKind::ElementNamespace,
                path,
                control.namespace_uri().unwrap_or("null"),
                received.namespace_uri().unwrap_or("null"),
            ));
        }

        if self.rules.is_ignored(received) {
            debug!("Element: '{}' is on ignore list - skipped validation", name);
            return Ok(());
        }
        if self.is_placeholder(control.first_child().filter(XmlNode::is_text)) {
            debug!(
                "Element: '{}' is ignored by placeholder '{}'",
                name, self.placeholder
            );
            return Ok(());
        }

        self.compare_attributes(received, control, &path)?;

        let received_children: Vec<_> = received.child_nodes().collect();
        let control_children: Vec<_> = control.child_nodes().collect();
        if received_children.len() != control_children.len() {
            return Err(ValidationError::mismatch(
                MismatchKind::ChildCount,
                path,
                control_children.len(),
                received_children.len(),
            ));
        }
        for (r, c) in received_children.into_iter().zip(control_children) {
            self.compare_nodes(r, c)?;
        }

        debug!("Validation successful for element: {}", name);
        Ok(())
    }

    fn compare_attributes(
        &self,
        received: XmlNode<'_>,
        control: XmlNode<'_>,
        path: &str,
    ) -> Result<()> {
        let received_count = received.attribute_nodes().count();
        let control_count = control.attribute_nodes().count();
        if received_count != control_count {
            return Err(ValidationError::mismatch(
                MismatchKind::AttributeCount,
                path,
                control_count,
                received_count,
            ));
        }

        for attribute in received.attribute_nodes() {
            let local = attribute.local_name().unwrap_or_default();
            let namespace = attribute.namespace_uri();
            let value = attribute.value().unwrap_or_default();
            debug!(
                "Validating attribute: {} ({})",
                local,
                namespace.unwrap_or("null")
            );

            let Some(expected) = control.attribute(local, namespace) else {
                return Err(ValidationError::mismatch(
                    MismatchKind::UnknownAttribute,
                    path_name(attribute),
                    "",
                    value,
                ));
            };
            if self.is_placeholder(Some(expected)) || self.rules.is_ignored(attribute) {
                debug!(
                    "Attribute '{}' is on ignore list - skipped value validation",
                    local
                );
                continue;
            }

            let expected_value = expected.value().unwrap_or_default();
            if value != expected_value {
                return Err(ValidationError::mismatch(
                    MismatchKind::AttributeValue,
                    path_name(attribute),
                    expected_value,
                    value,
                ));
            }
            debug!("Attribute '{}'='{}': OK", local, value);
        }
        Ok(())
    }

    fn compare_text(&self, received: XmlNode<'_>, control: XmlNode<'_>) -> Result<()> {
        let actual = received.value().map(str::trim);
        let expected = control.value().map(str::trim);
        match (actual, expected) {
            (Some(a), Some(e)) if a == e => {
                debug!("Node value '{}': OK", a);
                Ok(())
            }
            (None, None) => Ok(()),
            (None, Some("")) | (Some(""), None) => Ok(()),
            (a, e) => Err(ValidationError::mismatch(
                MismatchKind::NodeValue,
                path_name(received),
                e.unwrap_or("null"),
                a.unwrap_or("null"),
            )),
        }
    }

    fn is_placeholder(&self, node: Option<XmlNode<'_>>) -> bool {
        node.and_then(|n| n.value())
            .is_some_and(|v| v.trim() == self.placeholder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathEvaluator;
    use std::collections::{BTreeMap, BTreeSet};
    use verity_xml::NamespaceContext;

    fn compare_with(received: &str, control: &str, ignore: &[&str]) -> Result<()> {
        let received = XmlDocument::parse(received).unwrap();
        let control = XmlDocument::parse(control).unwrap();
        let namespaces = NamespaceContext::build(&received, &BTreeMap::new());
        let evaluator = PathEvaluator::new(&received, &namespaces);
        let expressions: BTreeSet<String> = ignore.iter().map(|s| s.to_string()).collect();
        let rules = IgnoreRules::new(&evaluator, &expressions)?;
        XmlTreeComparator::new(&rules, "@ignore@").compare(&received, &control)
    }

    fn compare(received: &str, control: &str) -> Result<()> {
        compare_with(received, control, &[])
    }

    fn mismatch_kind(result: Result<()>) -> Option<MismatchKind> {
        result.err().and_then(|e| e.kind())
    }

    #[test]
    fn test_identical_documents_match() {
        let doc = r#"<a:root xmlns:a="urn:a" id="1"><a:child k="v">text</a:child><!-- c --><empty/></a:root>"#;
        assert!(compare(doc, doc).is_ok());
    }

    #[test]
    fn test_text_is_compared_trimmed() {
        assert!(compare("<msg><id> 1 </id></msg>", "<msg><id>1</id></msg>").is_ok());
        let err = compare("<msg><id>2</id></msg>", "<msg><id>1</id></msg>").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Node values not equal for 'msg.id', expected '1' but was '2'"
        );
    }

    #[test]
    fn test_element_name_and_namespace() {
        assert_eq!(
            mismatch_kind(compare("<msg><a/></msg>", "<msg><b/></msg>")),
            Some(MismatchKind::ElementName)
        );
        assert_eq!(
            mismatch_kind(compare(
                r#"<msg xmlns="urn:x"/>"#,
                r#"<msg xmlns="urn:y"/>"#
            )),
            Some(MismatchKind::ElementNamespace)
        );
        assert_eq!(
            mismatch_kind(compare(r#"<msg xmlns="urn:x"/>"#, "<msg/>")),
            Some(MismatchKind::ElementNamespace)
        );
        // Prefixes are irrelevant when namespace URIs agree.
        assert!(compare(r#"<p:msg xmlns:p="urn:x"/>"#, r#"<q:msg xmlns:q="urn:x"/>"#).is_ok());
    }

    #[test]
    fn test_attributes() {
        assert!(compare(r#"<m a="1" b="2"/>"#, r#"<m b="2" a="1"/>"#).is_ok());
        assert_eq!(
            mismatch_kind(compare(r#"<m a="1"/>"#, r#"<m a="1" b="2"/>"#)),
            Some(MismatchKind::AttributeCount)
        );
        assert_eq!(
            mismatch_kind(compare(r#"<m c="1"/>"#, r#"<m a="1"/>"#)),
            Some(MismatchKind::UnknownAttribute)
        );
        assert_eq!(
            mismatch_kind(compare(r#"<m a="1"/>"#, r#"<m a="2"/>"#)),
            Some(MismatchKind::AttributeValue)
        );
        assert!(compare(r#"<m a="1"/>"#, r#"<m a=" @ignore@ "/>"#).is_ok());
        // Namespace declarations are not attributes.
        assert!(compare(r#"<m xmlns:x="urn:x" a="1"/>"#, r#"<m a="1"/>"#).is_ok());
    }

    #[test]
    fn test_placeholder_skips_subtree_but_not_parent_child_count() {
        assert!(compare(
            "<msg><id>1</id><val>999</val></msg>",
            "<msg><id>1</id><val>@ignore@</val></msg>"
        )
        .is_ok());
        assert!(compare(
            r#"<a><b x="1">anything<c/></b></a>"#,
            "<a><b>@ignore@</b></a>"
        )
        .is_ok());
        assert_eq!(
            mismatch_kind(compare("<a><b>x</b><b>y</b></a>", "<a><b>@ignore@</b></a>")),
            Some(MismatchKind::ChildCount)
        );
    }

    #[test]
    fn test_child_lists_are_positional() {
        assert_eq!(
            mismatch_kind(compare("<a><x/><y/></a>", "<a><y/><x/></a>")),
            Some(MismatchKind::ElementName)
        );
        assert_eq!(
            mismatch_kind(compare("<a><x/></a>", "<a><x/><x/></a>")),
            Some(MismatchKind::ChildCount)
        );
        assert_eq!(
            mismatch_kind(compare("<a>text</a>", "<a><x/></a>")),
            Some(MismatchKind::NodeType)
        );
    }

    #[test]
    fn test_comments_and_processing_instructions_always_match() {
        assert!(compare(
            "<a><!-- one --><?pi one?></a>",
            "<a><!-- two --><?pi two?></a>"
        )
        .is_ok());
    }

    #[test]
    fn test_ignore_rules_skip_subtrees_and_attributes() {
        let received = "<Root><N1><Item code='1'><Area>030</Area></Item></N1><N2><Item code='9'><Area>999</Area></Item></N2></Root>";
        let control = "<Root><N1><Item code='1'><Area>030</Area></Item></N1><N2><Item code='2'><Area>040</Area></Item></N2></Root>";
        assert!(compare_with(received, control, &["Root.N2"]).is_ok());
        assert!(compare_with(received, control, &["Root.N2.Item.code", "//N2//Area"]).is_ok());
        // A short name ignores only the first node carrying it.
        assert_eq!(
            mismatch_kind(compare_with(received, control, &["Area", "Item.code"])),
            Some(MismatchKind::AttributeValue)
        );
    }
}
