//! The read-only tree abstraction the evaluator is written against.
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// A qualified, namespace-resolved node name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName<'a> {
    pub prefix: Option<&'a str>,
    pub local_part: &'a str,
    /// The namespace URI the prefix (or default namespace) resolved to when the tree was built.
    pub namespace: Option<&'a str>,
}

/// The type of a node, aligned with the XPath 1.0 data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

/// A navigable node in a read-only, hierarchical document.
///
/// `Ord` must follow document order: the evaluator sorts every node-set with it, and
/// callers rely on the first node of a result being the first match in the document.
pub trait DataSourceNode<'a>:
    std::fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + PartialOrd + Ord
{
    fn node_type(&self) -> NodeType;

    /// The name of an element or attribute, or the target of a processing instruction.
    fn name(&self) -> Option<QName<'a>>;

    /// The XPath string value: text content for text nodes, the concatenated descendant
    /// text for elements and the root, the value for attributes.
    fn string_value(&self) -> String;

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// The parent node; for an attribute this is its owning element.
    fn parent(&self) -> Option<Self>;
}

/// Maps namespace prefixes used inside expressions to namespace URIs.
pub trait NamespaceResolver {
    fn resolve_prefix(&self, prefix: &str) -> Option<&str>;
}

impl NamespaceResolver for HashMap<String, String> {
    fn resolve_prefix(&self, prefix: &str) -> Option<&str> {
        self.get(prefix).map(String::as_str)
    }
}

impl NamespaceResolver for BTreeMap<String, String> {
    fn resolve_prefix(&self, prefix: &str) -> Option<&str> {
        self.get(prefix).map(String::as_str)
    }
}

/// A resolver with no bindings, for documents without namespaces.
pub struct NoNamespaces;

impl NamespaceResolver for NoNamespaces {
    fn resolve_prefix(&self, _prefix: &str) -> Option<&str> {
        None
    }
}
