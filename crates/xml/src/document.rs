//! An owned, immutable XML document arena.
//!
//! Documents are parsed once with `roxmltree` and copied into a flat arena so every node can
//! be addressed by a [`NodeHandle`]. Handles are stable for the life of the document and are
//! the only notion of node identity: two lookups that find the same node return equal handles.

use crate::error::XmlError;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use verity_xpath::{DataSourceNode, NodeType, QName};

/// Identifies a node, or an attribute of an element node, inside one [`XmlDocument`].
///
/// Node indices are assigned in document order, so the derived `Ord` is document order:
/// an element sorts before its attributes, and its attributes before its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeHandle {
    pub node: usize,
    pub attribute: Option<usize>,
}

impl NodeHandle {
    pub fn node(index: usize) -> Self {
        Self {
            node: index,
            attribute: None,
        }
    }

    pub fn attribute(owner: usize, index: usize) -> Self {
        Self {
            node: owner,
            attribute: Some(index),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

/// A namespace-resolved element or attribute name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlName {
    pub local_name: String,
    pub prefix: Option<String>,
    pub namespace: Option<String>,
}

impl XmlName {
    /// The name as written in the source, `prefix:local` or `local`.
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }
}

/// A namespace declared on an element. `prefix` is `None` for the default namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    pub prefix: Option<String>,
    pub uri: String,
}

#[derive(Debug, Clone)]
struct Attribute {
    name: XmlName,
    value: String,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    /// Element name, or the target of a processing instruction.
    name: Option<XmlName>,
    /// Text, comment or processing-instruction content.
    value: Option<String>,
    parent: Option<usize>,
    children: Vec<usize>,
    attributes: Vec<Attribute>,
    namespaces: Vec<NamespaceDecl>,
}

impl NodeData {
    fn new(kind: NodeKind, parent: Option<usize>) -> Self {
        Self {
            kind,
            name: None,
            value: None,
            parent,
            children: Vec::new(),
            attributes: Vec::new(),
            namespaces: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Drop text nodes that contain only whitespace.
    pub strip_whitespace: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strip_whitespace: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<NodeData>,
}

impl XmlDocument {
    /// Parses with the default options (whitespace-only text is stripped).
    pub fn parse(text: &str) -> Result<Self, XmlError> {
        Self::parse_with(text, ParseOptions::default())
    }

    pub fn parse_with(text: &str, options: ParseOptions) -> Result<Self, XmlError> {
        let parsing = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        let source = roxmltree::Document::parse_with_options(text, parsing)?;
        let mut doc = XmlDocument { nodes: Vec::new() };
        doc.nodes.push(NodeData::new(NodeKind::Document, None));
        for child in source.root().children() {
            doc.copy_node(child, 0, options);
        }
        log::trace!("Parsed XML document into {} nodes", doc.nodes.len());
        Ok(doc)
    }

    fn copy_node(&mut self, source: roxmltree::Node<'_, '_>, parent: usize, options: ParseOptions) {
        let data = match source.node_type() {
            roxmltree::NodeType::Element => {
                let mut data = NodeData::new(NodeKind::Element, Some(parent));
                data.name = Some(element_name(source));
                data.attributes = source
                    .attributes()
                    .map(|attr| Attribute {
                        name: XmlName {
                            local_name: attr.name().to_string(),
                            prefix: attr
                                .namespace()
                                .and_then(|uri| source.lookup_prefix(uri))
                                .map(str::to_string),
                            namespace: attr.namespace().map(str::to_string),
                        },
                        value: attr.value().to_string(),
                    })
                    .collect();
                data.namespaces = declared_namespaces(source);
                data
            }
            roxmltree::NodeType::Text => {
                let text = source.text().unwrap_or_default();
                if options.strip_whitespace && text.trim().is_empty() {
                    return;
                }
                let mut data = NodeData::new(NodeKind::Text, Some(parent));
                data.value = Some(text.to_string());
                data
            }
            roxmltree::NodeType::Comment => {
                let mut data = NodeData::new(NodeKind::Comment, Some(parent));
                data.value = source.text().map(str::to_string);
                data
            }
            roxmltree::NodeType::PI => {
                let mut data = NodeData::new(NodeKind::ProcessingInstruction, Some(parent));
                if let Some(pi) = source.pi() {
                    data.name = Some(XmlName {
                        local_name: pi.target.to_string(),
                        prefix: None,
                        namespace: None,
                    });
                    data.value = pi.value.map(str::to_string);
                }
                data
            }
            roxmltree::NodeType::Root => return,
        };

        let index = self.nodes.len();
        let has_children = data.kind == NodeKind::Element;
        self.nodes.push(data);
        self.nodes[parent].children.push(index);
        if has_children {
            for child in source.children() {
                self.copy_node(child, index, options);
            }
        }
    }

    /// The document node.
    pub fn root(&self) -> XmlNode<'_> {
        self.node(NodeHandle::node(0))
    }

    /// The single top-level element, if the document has one.
    pub fn document_element(&self) -> Option<XmlNode<'_>> {
        self.root().child_nodes().find(XmlNode::is_element)
    }

    /// `handle` must come from this document.
    pub(crate) fn node(&self, handle: NodeHandle) -> XmlNode<'_> {
        XmlNode { doc: self, handle }
    }

    /// Every element in document order.
    pub fn elements(&self) -> impl Iterator<Item = XmlNode<'_>> + '_ {
        (0..self.nodes.len())
            .filter(|&i| self.nodes[i].kind == NodeKind::Element)
            .map(|i| self.node(NodeHandle::node(i)))
    }
}

fn element_name(source: roxmltree::Node<'_, '_>) -> XmlName {
    let tag = source.tag_name();
    XmlName {
        local_name: tag.name().to_string(),
        prefix: tag
            .namespace()
            .and_then(|uri| source.lookup_prefix(uri))
            .map(str::to_string),
        namespace: tag.namespace().map(str::to_string),
    }
}

/// The namespaces an element declares itself, as opposed to those it inherits.
fn declared_namespaces(source: roxmltree::Node<'_, '_>) -> Vec<NamespaceDecl> {
    let inherited: Vec<(Option<&str>, &str)> = source
        .parent_element()
        .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();
    source
        .namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| NamespaceDecl {
            prefix: ns.name().map(str::to_string),
            uri: ns.uri().to_string(),
        })
        .collect()
}

/// A borrowed view of one node (or attribute) of an [`XmlDocument`].
#[derive(Clone, Copy)]
pub struct XmlNode<'d> {
    doc: &'d XmlDocument,
    handle: NodeHandle,
}

impl<'d> XmlNode<'d> {
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    pub fn document(&self) -> &'d XmlDocument {
        self.doc
    }

    fn data(&self) -> &'d NodeData {
        &self.doc.nodes[self.handle.node]
    }

    fn attribute_data(&self) -> Option<&'d Attribute> {
        self.handle
            .attribute
            .and_then(|i| self.data().attributes.get(i))
    }

    pub fn kind(&self) -> NodeKind {
        if self.handle.attribute.is_some() {
            NodeKind::Attribute
        } else {
            self.data().kind
        }
    }

    pub fn is_element(&self) -> bool {
        self.kind() == NodeKind::Element
    }

    pub fn is_attribute(&self) -> bool {
        self.kind() == NodeKind::Attribute
    }

    pub fn is_text(&self) -> bool {
        self.kind() == NodeKind::Text
    }

    /// The element or attribute name, or the target of a processing instruction.
    pub fn xml_name(&self) -> Option<&'d XmlName> {
        match self.attribute_data() {
            Some(attr) => Some(&attr.name),
            None => self.data().name.as_ref(),
        }
    }

    pub fn local_name(&self) -> Option<&'d str> {
        self.xml_name().map(|n| n.local_name.as_str())
    }

    pub fn namespace_uri(&self) -> Option<&'d str> {
        self.xml_name().and_then(|n| n.namespace.as_deref())
    }

    /// Text, comment and processing-instruction content, or an attribute's value.
    pub fn value(&self) -> Option<&'d str> {
        match self.attribute_data() {
            Some(attr) => Some(attr.value.as_str()),
            None => self.data().value.as_deref(),
        }
    }

    pub fn parent_node(&self) -> Option<XmlNode<'d>> {
        if self.handle.attribute.is_some() {
            return Some(self.doc.node(NodeHandle::node(self.handle.node)));
        }
        self.data().parent.map(|p| self.doc.node(NodeHandle::node(p)))
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = XmlNode<'d>> + 'd {
        let doc = self.doc;
        let children: &'d [usize] = if self.handle.attribute.is_some() {
            &[]
        } else {
            &self.data().children
        };
        children.iter().map(move |&i| doc.node(NodeHandle::node(i)))
    }

    pub fn first_child(&self) -> Option<XmlNode<'d>> {
        self.child_nodes().next()
    }

    pub fn attribute_nodes(&self) -> impl Iterator<Item = XmlNode<'d>> + 'd {
        let doc = self.doc;
        let owner = self.handle.node;
        let count = if self.handle.attribute.is_some() {
            0
        } else {
            self.data().attributes.len()
        };
        (0..count).map(move |i| doc.node(NodeHandle::attribute(owner, i)))
    }

    /// The attribute with the given local name and namespace.
    pub fn attribute(&self, local_name: &str, namespace: Option<&str>) -> Option<XmlNode<'d>> {
        self.attribute_nodes()
            .find(|a| a.local_name() == Some(local_name) && a.namespace_uri() == namespace)
    }

    /// Namespaces declared on this element.
    pub fn declared_namespaces(&self) -> &'d [NamespaceDecl] {
        if self.handle.attribute.is_some() {
            &[]
        } else {
            &self.data().namespaces
        }
    }

    /// Ancestor elements, nearest first.
    pub fn ancestor_elements(&self) -> impl Iterator<Item = XmlNode<'d>> + 'd {
        std::iter::successors(self.parent_node(), |n| n.parent_node()).filter(XmlNode::is_element)
    }
}

impl fmt::Debug for XmlNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlNode")
            .field("kind", &self.kind())
            .field("name", &self.xml_name().map(XmlName::qualified))
            .field("handle", &self.handle)
            .finish()
    }
}

impl PartialEq for XmlNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.handle == other.handle
    }
}

impl Eq for XmlNode<'_> {}

impl PartialOrd for XmlNode<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for XmlNode<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.handle.cmp(&other.handle)
    }
}

impl Hash for XmlNode<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl<'d> DataSourceNode<'d> for XmlNode<'d> {
    fn node_type(&self) -> NodeType {
        match self.kind() {
            NodeKind::Document => NodeType::Root,
            NodeKind::Element => NodeType::Element,
            NodeKind::Attribute => NodeType::Attribute,
            NodeKind::Text => NodeType::Text,
            NodeKind::Comment => NodeType::Comment,
            NodeKind::ProcessingInstruction => NodeType::ProcessingInstruction,
        }
    }

    fn name(&self) -> Option<QName<'d>> {
        self.xml_name().map(|n| QName {
            prefix: n.prefix.as_deref(),
            local_part: n.local_name.as_str(),
            namespace: n.namespace.as_deref(),
        })
    }

    fn string_value(&self) -> String {
        match self.kind() {
            NodeKind::Document | NodeKind::Element => {
                let mut out = String::new();
                collect_text(*self, &mut out);
                out
            }
            _ => self.value().unwrap_or_default().to_string(),
        }
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'd> {
        Box::new(self.attribute_nodes())
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'd> {
        Box::new(self.child_nodes())
    }

    fn parent(&self) -> Option<Self> {
        self.parent_node()
    }
}

fn collect_text(node: XmlNode<'_>, out: &mut String) {
    for child in node.child_nodes() {
        match child.kind() {
            NodeKind::Text => out.push_str(child.value().unwrap_or_default()),
            NodeKind::Element => collect_text(child, out),
            _ => {}
        }
    }
}
