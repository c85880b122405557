//! Node collection along each XPath axis.
//!
//! Every collector returns nodes in proximity order for its axis: document order for
//! forward axes, reverse document order for reverse axes. Positional predicates are
//! evaluated against this order.

use crate::ast::Axis;
use crate::datasource::{DataSourceNode, NodeType};

pub fn collect<'a, N: DataSourceNode<'a>>(axis: Axis, node: N) -> Vec<N> {
    let mut out = Vec::new();
    match axis {
        Axis::SelfAxis => out.push(node),
        Axis::Child => out.extend(node.children()),
        Axis::Attribute => out.extend(node.attributes()),
        Axis::Descendant => push_descendants(node, &mut out),
        Axis::DescendantOrSelf => {
            out.push(node);
            push_descendants(node, &mut out);
        }
        Axis::Parent => out.extend(node.parent()),
        Axis::Ancestor => push_ancestors(node, &mut out),
        Axis::AncestorOrSelf => {
            out.push(node);
            push_ancestors(node, &mut out);
        }
        Axis::FollowingSibling => out.extend(
            siblings(node)
                .into_iter()
                .skip_while(|s| *s != node)
                .skip(1),
        ),
        Axis::PrecedingSibling => {
            out.extend(siblings(node).into_iter().take_while(|s| *s != node));
            out.reverse();
        }
        Axis::Following => push_following(node, &mut out),
        Axis::Preceding => {
            push_preceding(node, &mut out);
            out.reverse();
        }
    }
    out
}

fn push_descendants<'a, N: DataSourceNode<'a>>(node: N, out: &mut Vec<N>) {
    for child in node.children() {
        out.push(child);
        push_descendants(child, out);
    }
}

fn push_ancestors<'a, N: DataSourceNode<'a>>(node: N, out: &mut Vec<N>) {
    let mut current = node.parent();
    while let Some(p) = current {
        out.push(p);
        current = p.parent();
    }
}

/// Attributes have no siblings.
fn siblings<'a, N: DataSourceNode<'a>>(node: N) -> Vec<N> {
    if node.node_type() == NodeType::Attribute {
        return vec![];
    }
    node.parent()
        .map(|p| p.children().collect())
        .unwrap_or_default()
}

fn push_following<'a, N: DataSourceNode<'a>>(node: N, out: &mut Vec<N>) {
    // For an attribute, the following nodes start with its owner's descendants.
    if node.node_type() == NodeType::Attribute {
        if let Some(owner) = node.parent() {
            push_descendants(owner, out);
            push_following(owner, out);
        }
        return;
    }
    let mut current = node;
    while let Some(parent) = current.parent() {
        for sibling in parent.children().skip_while(|s| *s != current).skip(1) {
            out.push(sibling);
            push_descendants(sibling, out);
        }
        current = parent;
    }
}

/// Collects preceding nodes (excluding ancestors) in document order.
fn push_preceding<'a, N: DataSourceNode<'a>>(node: N, out: &mut Vec<N>) {
    let start = if node.node_type() == NodeType::Attribute {
        match node.parent() {
            Some(owner) => owner,
            None => return,
        }
    } else {
        node
    };
    let mut chain = vec![start];
    push_ancestors(start, &mut chain);
    // Walk from the root down so the output stays in document order.
    for pair in chain.windows(2).rev() {
        let (child, parent) = (pair[0], pair[1]);
        for sibling in parent.children().take_while(|s| *s != child) {
            out.push(sibling);
            push_descendants(sibling, out);
        }
    }
}
