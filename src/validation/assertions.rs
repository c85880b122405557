//! Independent path assertions against the received document.

use crate::error::{MismatchKind, Result, ValidationError};
use crate::ignore::IgnoreRules;
use crate::path::{Lookup, PathEvaluator, ResultKind, is_path_expression};
use crate::resolver::DynamicContent;
use log::{debug, info};
use std::collections::BTreeMap;
use verity_xml::node_value;

/// Checks each `expression -> expected` entry in order and stops at the first failure.
///
/// Expressions have their dynamic content replaced before evaluation. A node-valued
/// expression whose node is ignored is skipped. Expected values are resolved as a variable,
/// then as a function call, then taken literally. A node without a value only satisfies an
/// expected value that is absent or empty.
pub fn assert_paths(
    evaluator: &PathEvaluator<'_>,
    rules: &IgnoreRules,
    assertions: &BTreeMap<String, Option<String>>,
    resolver: &dyn DynamicContent,
) -> Result<()> {
    info!("Start XML elements validation");

    for (raw_expression, raw_expected) in assertions {
        let expression = resolver.replace_dynamic_content(raw_expression)?;

        let actual = if is_path_expression(&expression) {
            let (kind, path) = ResultKind::split(&expression);
            if kind == ResultKind::Node {
                match evaluator.select_node(path)? {
                    Lookup::Found(node) if rules.is_ignored(node) => {
                        debug!("Path assertion '{}' targets an ignored node", expression);
                        continue;
                    }
                    Lookup::Found(node) => node_value(node).map(str::to_string),
                    Lookup::NotFound => {
                        return Err(ValidationError::UnknownElement(path.to_string()));
                    }
                }
            } else {
                evaluator.evaluate(path, kind)?
            }
        } else {
            match evaluator.locate(&expression)? {
                Lookup::Found(node) if rules.is_ignored(node) => {
                    debug!("Path assertion '{}' targets an ignored node", expression);
                    continue;
                }
                Lookup::Found(node) => node_value(node).map(str::to_string),
                Lookup::NotFound => return Err(ValidationError::UnknownElement(expression)),
            }
        };

        let expected = raw_expected
            .as_deref()
            .map(|value| resolver.resolve_value(value))
            .transpose()?;

        let matches = match (&actual, &expected) {
            (Some(a), Some(e)) => a == e,
            (Some(_), None) => false,
            (None, e) => e.as_deref().is_none_or(str::is_empty),
        };
        if !matches {
            return Err(ValidationError::mismatch(
                MismatchKind::NodeValue,
                expression,
                expected.as_deref().unwrap_or("null"),
                actual.as_deref().unwrap_or("null"),
            ));
        }
        debug!(
            "Validating element: {}='{}': OK.",
            expression,
            expected.as_deref().unwrap_or("null")
        );
    }

    info!("Validation of XML elements finished successfully: All elements OK");
    Ok(())
}
