//! Path expression evaluation against a received document.
//!
//! Two dialects are accepted. A path expression (anything containing `/` or `(`) is XPath
//! 1.0 with an optional result-kind prefix such as `integer:` or `node-set:`. Anything else is
//! a dotted short name resolved with [`find_node_by_name`].

use crate::error::{Result, ValidationError};
use std::collections::HashMap;
use verity_xml::{NamespaceContext, XmlDocument, XmlNode, find_node_by_name, node_value};
use verity_xpath::engine::format_number;
use verity_xpath::{EvaluationContext, FunctionRegistry, XPathValue, evaluate, parse_expression};

/// Whether `expr` is written in the XPath dialect rather than as a dotted short name.
pub fn is_path_expression(expr: &str) -> bool {
    expr.contains('/') || expr.contains('(')
}

/// The result kind requested by an expression prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Node,
    NodeSet,
    String,
    Number,
    Integer,
    Boolean,
}

impl ResultKind {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "node" => Some(ResultKind::Node),
            "node-set" => Some(ResultKind::NodeSet),
            "string" => Some(ResultKind::String),
            "number" => Some(ResultKind::Number),
            "integer" => Some(ResultKind::Integer),
            "boolean" => Some(ResultKind::Boolean),
            _ => None,
        }
    }

    /// Splits a result-kind prefix off `expr`. Without a recognized prefix the expression is
    /// returned unchanged with [`ResultKind::Node`], so `ns:Element` stays intact.
    pub fn split(expr: &str) -> (ResultKind, &str) {
        expr.split_once(':')
            .and_then(|(prefix, rest)| Self::from_prefix(prefix).map(|kind| (kind, rest)))
            .unwrap_or((ResultKind::Node, expr))
    }
}

/// The outcome of locating a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'d> {
    Found(XmlNode<'d>),
    NotFound,
}

impl<'d> Lookup<'d> {
    pub fn node(self) -> Option<XmlNode<'d>> {
        match self {
            Lookup::Found(node) => Some(node),
            Lookup::NotFound => None,
        }
    }
}

/// Evaluates expressions against one document with one namespace context.
pub struct PathEvaluator<'d> {
    doc: &'d XmlDocument,
    namespaces: &'d NamespaceContext,
    functions: FunctionRegistry,
}

impl<'d> PathEvaluator<'d> {
    pub fn new(doc: &'d XmlDocument, namespaces: &'d NamespaceContext) -> Self {
        Self {
            doc,
            namespaces,
            functions: FunctionRegistry::default(),
        }
    }

    pub fn document(&self) -> &'d XmlDocument {
        self.doc
    }

    fn evaluate_xpath(&self, expr: &str) -> Result<XPathValue<XmlNode<'d>>> {
        let parsed = parse_expression(expr)?;
        let variables = HashMap::new();
        let e_ctx = EvaluationContext::new(
            self.doc.root(),
            &self.functions,
            &variables,
            self.namespaces,
        );
        Ok(evaluate(&parsed, &e_ctx)?)
    }

    /// All nodes an XPath expression selects, in document order.
    pub fn select_nodes(&self, expr: &str) -> Result<Vec<XmlNode<'d>>> {
        match self.evaluate_xpath(expr)? {
            XPathValue::NodeSet(nodes) => Ok(nodes),
            other => Err(ValidationError::Configuration(format!(
                "Path expression '{}' selects a {}, not nodes",
                expr,
                other.type_name()
            ))),
        }
    }

    /// The first node (in document order) an XPath expression selects.
    pub fn select_node(&self, expr: &str) -> Result<Lookup<'d>> {
        Ok(match self.select_nodes(expr)?.first() {
            Some(&node) => Lookup::Found(node),
            None => Lookup::NotFound,
        })
    }

    /// Locates a node in either dialect. Result-kind prefixes are not accepted here.
    pub fn locate(&self, expr: &str) -> Result<Lookup<'d>> {
        if is_path_expression(expr) {
            self.select_node(expr)
        } else {
            Ok(find_node_by_name(self.doc, expr).map_or(Lookup::NotFound, Lookup::Found))
        }
    }

    /// Evaluates an XPath expression (without its prefix) to the string form of `kind`.
    ///
    /// `None` is returned only for a node result whose node carries no value. A missing node
    /// is an [`ValidationError::UnknownElement`].
    pub fn evaluate(&self, expr: &str, kind: ResultKind) -> Result<Option<String>> {
        if kind == ResultKind::Node {
            return match self.select_node(expr)? {
                Lookup::Found(node) => Ok(node_value(node).map(str::to_string)),
                Lookup::NotFound => Err(ValidationError::UnknownElement(expr.to_string())),
            };
        }

        let value = self.evaluate_xpath(expr)?;
        let rendered = match kind {
            ResultKind::NodeSet => match value {
                XPathValue::NodeSet(nodes) => nodes
                    .iter()
                    .map(|n| node_value(*n).unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join(","),
                other => {
                    return Err(ValidationError::Configuration(format!(
                        "Path expression '{}' selects a {}, not a node-set",
                        expr,
                        other.type_name()
                    )));
                }
            },
            ResultKind::Number => format_number(value.to_number()),
            ResultKind::Integer => (value.to_number().trunc() as i64).to_string(),
            ResultKind::Boolean => value.to_bool().to_string(),
            ResultKind::String | ResultKind::Node => value.to_string(),
        };
        Ok(Some(rendered))
    }
}
