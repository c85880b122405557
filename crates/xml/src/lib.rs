pub mod document;
pub mod error;
pub mod namespace;
pub mod path;
pub mod serialize;

pub use document::{
    NamespaceDecl, NodeHandle, NodeKind, ParseOptions, XmlDocument, XmlName, XmlNode,
};
pub use error::XmlError;
pub use namespace::{NamespaceContext, root_namespaces};
pub use path::{find_node_by_name, node_value, path_name};
pub use serialize::to_pretty_string;
