//! The evaluation engine for executing a parsed XPath AST against a generic `DataSourceNode`.

use super::ast::{Axis, Expression, LocationPath, NodeTest, NodeTypeTest, Step};
use super::functions::{self, FunctionRegistry};
use super::{axes, operators};
use crate::datasource::{DataSourceNode, NamespaceResolver, NodeType};
use crate::error::XPathError;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// The result of evaluating an XPath expression.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathValue<N> {
    /// Always sorted in document order without duplicates.
    NodeSet(Vec<N>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl<'a, N: DataSourceNode<'a>> XPathValue<N> {
    pub fn to_bool(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::Boolean(b) => *b,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            XPathValue::Number(n) => *n,
            XPathValue::Boolean(b) => f64::from(u8::from(*b)),
            XPathValue::String(_) | XPathValue::NodeSet(_) => parse_number(&self.to_string()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            XPathValue::NodeSet(_) => "node-set",
            XPathValue::String(_) => "string",
            XPathValue::Number(_) => "number",
            XPathValue::Boolean(_) => "boolean",
        }
    }
}

/// XPath string-to-number conversion: optional minus, digits, optional fraction.
pub fn parse_number(s: &str) -> f64 {
    let t = s.trim();
    let body = t.strip_prefix('-').unwrap_or(t);
    let valid = !body.is_empty()
        && body.chars().all(|c| c.is_ascii_digit() || c == '.')
        && body.matches('.').count() <= 1
        && body != ".";
    if valid { t.parse().unwrap_or(f64::NAN) } else { f64::NAN }
}

/// XPath number-to-string conversion.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl<'a, N: DataSourceNode<'a>> fmt::Display for XPathValue<N> {
    /// Coerces the value to a string as per XPath 1.0 rules.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XPathValue::NodeSet(nodes) => write!(
                f,
                "{}",
                nodes.first().map(|n| n.string_value()).unwrap_or_default()
            ),
            XPathValue::String(s) => write!(f, "{}", s),
            XPathValue::Number(n) => write!(f, "{}", format_number(*n)),
            XPathValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// All state needed during expression evaluation.
/// `'a` is the lifetime of the document, `'d` the lifetime of the borrowed evaluation inputs.
pub struct EvaluationContext<'a, 'd, N: DataSourceNode<'a>> {
    pub context_node: N,
    pub root_node: N,
    pub functions: &'d FunctionRegistry,
    pub context_position: usize, // 1-based index
    pub context_size: usize,
    pub variables: &'d HashMap<String, XPathValue<N>>,
    pub namespaces: &'d dyn NamespaceResolver,
    _marker: PhantomData<&'a ()>,
}

impl<'a, 'd, N: DataSourceNode<'a>> EvaluationContext<'a, 'd, N> {
    pub fn new(
        root_node: N,
        functions: &'d FunctionRegistry,
        variables: &'d HashMap<String, XPathValue<N>>,
        namespaces: &'d dyn NamespaceResolver,
    ) -> Self {
        Self {
            context_node: root_node,
            root_node,
            functions,
            context_position: 1,
            context_size: 1,
            variables,
            namespaces,
            _marker: PhantomData,
        }
    }

    /// A derived context focused on `node` at the given position, used for predicates.
    pub fn focus(&self, node: N, position: usize, size: usize) -> Self {
        Self {
            context_node: node,
            root_node: self.root_node,
            functions: self.functions,
            context_position: position,
            context_size: size,
            variables: self.variables,
            namespaces: self.namespaces,
            _marker: PhantomData,
        }
    }
}

/// Evaluates a compiled expression and returns a concrete `XPathValue`.
pub fn evaluate<'a, N>(
    expr: &Expression,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<XPathValue<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    match expr {
        Expression::Literal(s) => Ok(XPathValue::String(s.clone())),
        Expression::Number(n) => Ok(XPathValue::Number(*n)),
        Expression::LocationPath(path) => {
            Ok(XPathValue::NodeSet(evaluate_location_path(path, e_ctx)?))
        }
        Expression::Variable(name) => e_ctx
            .variables
            .get(name)
            .cloned()
            .ok_or_else(|| XPathError::UnknownVariable(name.clone())),
        Expression::FunctionCall { name, args } => {
            let evaluated_args = args
                .iter()
                .map(|arg| evaluate(arg, e_ctx))
                .collect::<Result<Vec<_>, _>>()?;
            functions::evaluate_function(name, evaluated_args, e_ctx)
        }
        Expression::BinaryOp { left, op, right } => {
            let left_val = evaluate(left, e_ctx)?;
            let right_val = evaluate(right, e_ctx)?;
            operators::evaluate(*op, left_val, right_val)
        }
        Expression::Negate(inner) => Ok(XPathValue::Number(-evaluate(inner, e_ctx)?.to_number())),
        Expression::Filter {
            primary,
            predicates,
        } => match evaluate(primary, e_ctx)? {
            XPathValue::NodeSet(nodes) => Ok(XPathValue::NodeSet(apply_predicates(
                nodes, predicates, e_ctx,
            )?)),
            other => Err(XPathError::TypeError(format!(
                "Predicates can only filter a node-set, got {}",
                other.type_name()
            ))),
        },
    }
}

fn evaluate_location_path<'a, N>(
    path: &LocationPath,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut current_nodes = if let Some(start_expr) = &path.start_point {
        match evaluate(start_expr, e_ctx)? {
            XPathValue::NodeSet(nodes) => nodes,
            other => {
                return Err(XPathError::TypeError(format!(
                    "A path can only continue from a node-set, got {}",
                    other.type_name()
                )));
            }
        }
    } else if path.is_absolute {
        vec![e_ctx.root_node]
    } else {
        vec![e_ctx.context_node]
    };

    for step in &path.steps {
        current_nodes = evaluate_step(step, &current_nodes, e_ctx)?;
    }
    Ok(current_nodes)
}

/// Evaluates one step for every context node: axis, node test, then predicates scoped to
/// that context node's axis set. The merged result is returned in document order.
fn evaluate_step<'a, N>(
    step: &Step,
    context_nodes: &[N],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut result = Vec::new();
    for &node in context_nodes {
        let mut candidates = Vec::new();
        for candidate in axes::collect(step.axis, node) {
            if matches_node_test(candidate, &step.node_test, step.axis, e_ctx)? {
                candidates.push(candidate);
            }
        }
        result.extend(apply_predicates(candidates, &step.predicates, e_ctx)?);
    }
    result.sort();
    result.dedup();
    Ok(result)
}

fn matches_node_test<'a, N>(
    node: N,
    test: &NodeTest,
    axis: Axis,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<bool, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let principal = if axis == Axis::Attribute {
        NodeType::Attribute
    } else {
        NodeType::Element
    };
    let matches = match test {
        NodeTest::Wildcard => node.node_type() == principal,
        NodeTest::NamespaceWildcard(prefix) => {
            let uri = resolve_prefix(prefix, e_ctx)?;
            node.node_type() == principal && node.name().is_some_and(|q| q.namespace == Some(uri))
        }
        NodeTest::Name { prefix, local } => {
            let uri = match prefix {
                Some(p) => Some(resolve_prefix(p, e_ctx)?),
                None => None,
            };
            node.node_type() == principal
                && node
                    .name()
                    .is_some_and(|q| q.local_part == local.as_str() && q.namespace == uri)
        }
        NodeTest::NodeType(ntt) => match ntt {
            NodeTypeTest::Text => node.node_type() == NodeType::Text,
            NodeTypeTest::Comment => node.node_type() == NodeType::Comment,
            NodeTypeTest::ProcessingInstruction => {
                node.node_type() == NodeType::ProcessingInstruction
            }
            NodeTypeTest::Node => true,
        },
    };
    Ok(matches)
}

fn resolve_prefix<'d, 'a, N>(
    prefix: &str,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<&'d str, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    e_ctx
        .namespaces
        .resolve_prefix(prefix)
        .ok_or_else(|| XPathError::UnknownPrefix(prefix.to_string()))
}

/// Filters `nodes` (in axis proximity order) through each predicate in turn.
fn apply_predicates<'a, N>(
    nodes: Vec<N>,
    predicates: &[Expression],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut remaining = nodes;
    for predicate in predicates {
        let size = remaining.len();
        let mut kept = Vec::with_capacity(size);
        for (i, node) in remaining.into_iter().enumerate() {
            let result = evaluate(predicate, &e_ctx.focus(node, i + 1, size))?;
            let keep = match result {
                XPathValue::Number(n) => n == (i + 1) as f64,
                other => other.to_bool(),
            };
            if keep {
                kept.push(node);
            }
        }
        remaining = kept;
    }
    Ok(remaining)
}
