//! Contains pure functions for evaluating XPath binary operators.

use super::ast::BinaryOperator;
use super::engine::XPathValue;
use crate::datasource::DataSourceNode;
use crate::error::XPathError;

pub fn evaluate<'a, N: DataSourceNode<'a> + 'a>(
    op: BinaryOperator,
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    use BinaryOperator::*;
    match op {
        Or => Ok(XPathValue::Boolean(left.to_bool() || right.to_bool())),
        And => Ok(XPathValue::Boolean(left.to_bool() && right.to_bool())),
        Equals | NotEquals | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            Ok(XPathValue::Boolean(compare(op, &left, &right)))
        }
        Plus => Ok(XPathValue::Number(left.to_number() + right.to_number())),
        Minus => Ok(XPathValue::Number(left.to_number() - right.to_number())),
        Multiply => Ok(XPathValue::Number(left.to_number() * right.to_number())),
        Divide => Ok(XPathValue::Number(left.to_number() / right.to_number())),
        Modulo => Ok(XPathValue::Number(left.to_number() % right.to_number())),
        Union => evaluate_union(left, right),
    }
}

/// Comparison involving node-sets is existential: it holds if it holds for any
/// node's string value. A node-set compared with a boolean is converted to a boolean.
fn compare<'a, N: DataSourceNode<'a> + 'a>(
    op: BinaryOperator,
    left: &XPathValue<N>,
    right: &XPathValue<N>,
) -> bool {
    match (left, right) {
        (XPathValue::NodeSet(_), XPathValue::Boolean(_))
        | (XPathValue::Boolean(_), XPathValue::NodeSet(_)) => compare_scalars(
            op,
            &XPathValue::<N>::Boolean(left.to_bool()),
            &XPathValue::<N>::Boolean(right.to_bool()),
        ),
        (XPathValue::NodeSet(nodes), other) => nodes
            .iter()
            .any(|n| compare(op, &XPathValue::String(n.string_value()), other)),
        (other, XPathValue::NodeSet(nodes)) => nodes
            .iter()
            .any(|n| compare(op, other, &XPathValue::String(n.string_value()))),
        _ => compare_scalars(op, left, right),
    }
}

fn compare_scalars<'a, N: DataSourceNode<'a> + 'a>(
    op: BinaryOperator,
    left: &XPathValue<N>,
    right: &XPathValue<N>,
) -> bool {
    use BinaryOperator::*;
    let equal = || match (left, right) {
        (XPathValue::Boolean(_), _) | (_, XPathValue::Boolean(_)) => {
            left.to_bool() == right.to_bool()
        }
        (XPathValue::Number(_), _) | (_, XPathValue::Number(_)) => {
            left.to_number() == right.to_number()
        }
        _ => left.to_string() == right.to_string(),
    };
    let (l, r) = (left.to_number(), right.to_number());
    match op {
        Equals => equal(),
        NotEquals => !equal(),
        LessThan => l < r,
        LessThanOrEqual => l <= r,
        GreaterThan => l > r,
        GreaterThanOrEqual => l >= r,
        _ => false,
    }
}

fn evaluate_union<'a, N: DataSourceNode<'a> + 'a>(
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    let XPathValue::NodeSet(mut merged) = left else {
        return Err(XPathError::TypeError(
            "Left-hand side of '|' must be a node-set.".to_string(),
        ));
    };
    let XPathValue::NodeSet(r_nodes) = right else {
        return Err(XPathError::TypeError(
            "Right-hand side of '|' must be a node-set.".to_string(),
        ));
    };
    merged.extend(r_nodes);
    merged.sort();
    merged.dedup();
    Ok(XPathValue::NodeSet(merged))
}
