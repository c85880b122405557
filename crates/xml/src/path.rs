//! Dotted node path names and the short-name locator built on them.
//!
//! A path name joins ancestor element local names from the document element down, for
//! example `Numbers.NumberItem.AreaCode`. Path names are computed on demand from the tree
//! being walked and never cached.

use crate::document::{NodeKind, XmlDocument, XmlNode};

/// The dotted path name of a node.
///
/// Attributes append their qualified name to the owning element's path. Text, comment and
/// processing-instruction nodes share the path of their parent element.
pub fn path_name(node: XmlNode<'_>) -> String {
    match node.kind() {
        NodeKind::Element => {
            let mut names: Vec<&str> = node
                .ancestor_elements()
                .filter_map(|a| a.local_name())
                .collect();
            names.reverse();
            names.extend(node.local_name());
            names.join(".")
        }
        NodeKind::Attribute => {
            let owner = node.parent_node().map(path_name).unwrap_or_default();
            let name = node.xml_name().map(|n| n.qualified()).unwrap_or_default();
            if owner.is_empty() {
                name
            } else {
                format!("{}.{}", owner, name)
            }
        }
        NodeKind::Document => String::new(),
        NodeKind::Text | NodeKind::Comment | NodeKind::ProcessingInstruction => {
            node.parent_node().map(path_name).unwrap_or_default()
        }
    }
}

/// Locates a node by a dotted short name such as `Leaf`, `Child.Leaf` or `Child.attr`.
///
/// A single token selects the first element in document order with that local name,
/// ignoring namespaces. With several tokens, the first element named like the last token
/// whose nearest ancestors carry the preceding tokens is selected. If no element carries the
/// last token's name at all, it is read as an attribute of the node the prefix selects.
pub fn find_node_by_name<'d>(doc: &'d XmlDocument, name: &str) -> Option<XmlNode<'d>> {
    let tokens: Vec<&str> = name.split('.').filter(|t| !t.is_empty()).collect();
    let (&last, prefix) = tokens.split_last()?;

    let mut candidates = doc
        .elements()
        .filter(|e| e.local_name() == Some(last))
        .peekable();

    if prefix.is_empty() {
        return candidates.next();
    }

    if candidates.peek().is_none() {
        let owner = find_node_by_name(doc, &prefix.join("."))?;
        return owner
            .attribute_nodes()
            .find(|a| a.xml_name().is_some_and(|n| n.qualified() == last));
    }

    candidates.find(|candidate| {
        let ancestors: Vec<&str> = candidate
            .ancestor_elements()
            .take(prefix.len())
            .filter_map(|a| a.local_name())
            .collect();
        ancestors.len() == prefix.len() && ancestors.iter().rev().eq(prefix.iter())
    })
}

/// The value a node contributes to an assertion: an element's first child when that child
/// is text, an attribute's value, or a text node's content.
pub fn node_value<'d>(node: XmlNode<'d>) -> Option<&'d str> {
    match node.kind() {
        NodeKind::Element => node
            .first_child()
            .filter(|child| child.is_text())
            .and_then(|child| child.value()),
        NodeKind::Attribute | NodeKind::Text => node.value(),
        NodeKind::Document | NodeKind::Comment | NodeKind::ProcessingInstruction => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUMBERS: &str = r#"<Numbers xmlns:x="urn:x">
        <NumberItem type="home"><AreaCode>030</AreaCode><Number>123</Number></NumberItem>
        <NumberItem x:type="work"><AreaCode>040</AreaCode><Number>456</Number></NumberItem>
        <Extra><Number>789</Number></Extra>
    </Numbers>"#;

    #[test]
    fn test_path_names() {
        let doc = XmlDocument::parse(NUMBERS).unwrap();
        let root = doc.document_element().unwrap();
        assert_eq!(path_name(root), "Numbers");

        let item = root.first_child().unwrap();
        let area = item.first_child().unwrap();
        assert_eq!(path_name(area), "Numbers.NumberItem.AreaCode");
        assert_eq!(path_name(area.first_child().unwrap()), "Numbers.NumberItem.AreaCode");
        assert_eq!(
            path_name(item.attribute("type", None).unwrap()),
            "Numbers.NumberItem.type"
        );

        let second = root.child_nodes().nth(1).unwrap();
        let prefixed = second.attribute("type", Some("urn:x")).unwrap();
        assert_eq!(path_name(prefixed), "Numbers.NumberItem.x:type");
    }

    #[test]
    fn test_single_token_selects_first_match() {
        let doc = XmlDocument::parse(NUMBERS).unwrap();
        let area = find_node_by_name(&doc, "AreaCode").unwrap();
        assert_eq!(node_value(area), Some("030"));
        assert!(find_node_by_name(&doc, "Missing").is_none());
    }

    #[test]
    fn test_multiple_tokens_match_the_ancestor_chain() {
        let doc = XmlDocument::parse(NUMBERS).unwrap();
        let number = find_node_by_name(&doc, "Extra.Number").unwrap();
        assert_eq!(node_value(number), Some("789"));

        let full = find_node_by_name(&doc, "Numbers.NumberItem.Number").unwrap();
        assert_eq!(node_value(full), Some("123"));

        // The chain must be complete, not merely a suffix of a longer name.
        assert!(find_node_by_name(&doc, "Root.Numbers.NumberItem.Number").is_none());
    }

    #[test]
    fn test_last_token_falls_back_to_an_attribute() {
        let doc = XmlDocument::parse(NUMBERS).unwrap();
        let attr = find_node_by_name(&doc, "NumberItem.type").unwrap();
        assert!(attr.is_attribute());
        assert_eq!(node_value(attr), Some("home"));
        assert!(find_node_by_name(&doc, "Extra.type").is_none());
    }

    #[test]
    fn test_node_value_of_elements() {
        let doc = XmlDocument::parse("<a><b/><c><d/>text</c></a>").unwrap();
        assert_eq!(node_value(find_node_by_name(&doc, "b").unwrap()), None);
        // The first child of `c` is an element, not text.
        assert_eq!(node_value(find_node_by_name(&doc, "c").unwrap()), None);
    }
}
