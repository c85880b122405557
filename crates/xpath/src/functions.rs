//! The XPath 1.0 core function library.

use super::engine::{EvaluationContext, XPathValue, parse_number};
use crate::datasource::DataSourceNode;
use crate::error::XPathError;
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// The set of function names callable from expressions.
///
/// Dispatch is static; the registry decides which names are enabled so callers can
/// restrict the library.
pub struct FunctionRegistry {
    functions: HashSet<&'static str>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self {
            functions: HashSet::new(),
        }
    }

    pub fn register(&mut self, name: &'static str) {
        self.functions.insert(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains(name)
    }
}

const CORE_FUNCTIONS: &[&str] = &[
    // Node-set
    "last",
    "position",
    "count",
    "local-name",
    "namespace-uri",
    "name",
    // String
    "string",
    "concat",
    "starts-with",
    "contains",
    "substring-before",
    "substring-after",
    "substring",
    "string-length",
    "normalize-space",
    "translate",
    // Boolean
    "boolean",
    "not",
    "true",
    "false",
    // Number
    "number",
    "sum",
    "floor",
    "ceiling",
    "round",
];

impl Default for FunctionRegistry {
    /// A registry with the complete core library enabled.
    fn default() -> Self {
        let mut registry = Self::new();
        for name in CORE_FUNCTIONS {
            registry.register(name);
        }
        registry
    }
}

fn check_arity<N>(
    name: &str,
    args: &[XPathValue<N>],
    allowed: RangeInclusive<usize>,
) -> Result<(), XPathError> {
    if allowed.contains(&args.len()) {
        Ok(())
    } else {
        let expected = if allowed.start() == allowed.end() {
            allowed.start().to_string()
        } else {
            format!("{} to {}", allowed.start(), allowed.end())
        };
        Err(XPathError::FunctionError {
            function: format!("{}()", name),
            message: format!("Expected {} argument(s), got {}", expected, args.len()),
        })
    }
}

/// The optional node argument of `name()`-style functions, defaulting to the context node.
fn node_argument<'a, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Option<N>, XPathError> {
    match args.into_iter().next() {
        None => Ok(Some(e_ctx.context_node)),
        Some(XPathValue::NodeSet(nodes)) => Ok(nodes.first().copied()),
        Some(other) => Err(XPathError::TypeError(format!(
            "{}() argument must be a node-set, got {}",
            name,
            other.type_name()
        ))),
    }
}

/// The optional string argument of string functions, defaulting to the context node's value.
fn string_argument<'a, N: DataSourceNode<'a>>(
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> String {
    match args.into_iter().next() {
        Some(value) => value.to_string(),
        None => e_ctx.context_node.string_value(),
    }
}

fn strings<'a, N: DataSourceNode<'a>>(args: Vec<XPathValue<N>>) -> Vec<String> {
    args.into_iter().map(|v| v.to_string()).collect()
}

/// Dispatches a function call to the correct implementation.
pub fn evaluate_function<'a, N: DataSourceNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<XPathValue<N>, XPathError> {
    if !e_ctx.functions.contains(name) {
        return Err(XPathError::FunctionError {
            function: name.to_string(),
            message: "Unknown XPath function".to_string(),
        });
    }

    let value = match name {
        "last" => {
            check_arity(name, &args, 0..=0)?;
            XPathValue::Number(e_ctx.context_size as f64)
        }
        "position" => {
            check_arity(name, &args, 0..=0)?;
            XPathValue::Number(e_ctx.context_position as f64)
        }
        "count" => {
            check_arity(name, &args, 1..=1)?;
            match &args[0] {
                XPathValue::NodeSet(nodes) => XPathValue::Number(nodes.len() as f64),
                other => {
                    return Err(XPathError::TypeError(format!(
                        "count() argument must be a node-set, got {}",
                        other.type_name()
                    )));
                }
            }
        }
        "local-name" | "namespace-uri" | "name" => {
            check_arity(name, &args, 0..=1)?;
            let q_name = node_argument(name, args, e_ctx)?.and_then(|n| n.name());
            let s = match (name, q_name) {
                (_, None) => String::new(),
                ("local-name", Some(q)) => q.local_part.to_string(),
                ("namespace-uri", Some(q)) => q.namespace.unwrap_or_default().to_string(),
                (_, Some(q)) => match q.prefix {
                    Some(prefix) => format!("{}:{}", prefix, q.local_part),
                    None => q.local_part.to_string(),
                },
            };
            XPathValue::String(s)
        }
        "string" => {
            check_arity(name, &args, 0..=1)?;
            XPathValue::String(string_argument(args, e_ctx))
        }
        "concat" => {
            if args.len() < 2 {
                return Err(XPathError::FunctionError {
                    function: "concat()".to_string(),
                    message: format!("Expected at least 2 arguments, got {}", args.len()),
                });
            }
            XPathValue::String(strings(args).concat())
        }
        "starts-with" | "contains" => {
            check_arity(name, &args, 2..=2)?;
            let s = strings(args);
            let found = if name == "contains" {
                s[0].contains(s[1].as_str())
            } else {
                s[0].starts_with(s[1].as_str())
            };
            XPathValue::Boolean(found)
        }
        "substring-before" => {
            check_arity(name, &args, 2..=2)?;
            let s = strings(args);
            let before = s[0].find(s[1].as_str()).map(|i| &s[0][..i]).unwrap_or("");
            XPathValue::String(before.to_string())
        }
        "substring-after" => {
            check_arity(name, &args, 2..=2)?;
            let s = strings(args);
            let after = s[0]
                .find(s[1].as_str())
                .map(|i| &s[0][i + s[1].len()..])
                .unwrap_or("");
            XPathValue::String(after.to_string())
        }
        "substring" => {
            check_arity(name, &args, 2..=3)?;
            substring(args)
        }
        "string-length" => {
            check_arity(name, &args, 0..=1)?;
            XPathValue::Number(string_argument(args, e_ctx).chars().count() as f64)
        }
        "normalize-space" => {
            check_arity(name, &args, 0..=1)?;
            let s = string_argument(args, e_ctx);
            XPathValue::String(s.split_whitespace().collect::<Vec<_>>().join(" "))
        }
        "translate" => {
            check_arity(name, &args, 3..=3)?;
            let s = strings(args);
            let from: Vec<char> = s[1].chars().collect();
            let to: Vec<char> = s[2].chars().collect();
            let translated = s[0]
                .chars()
                .filter_map(|c| match from.iter().position(|&f| f == c) {
                    Some(i) => to.get(i).copied(),
                    None => Some(c),
                })
                .collect();
            XPathValue::String(translated)
        }
        "boolean" => {
            check_arity(name, &args, 1..=1)?;
            XPathValue::Boolean(args[0].to_bool())
        }
        "not" => {
            check_arity(name, &args, 1..=1)?;
            XPathValue::Boolean(!args[0].to_bool())
        }
        "true" | "false" => {
            check_arity(name, &args, 0..=0)?;
            XPathValue::Boolean(name == "true")
        }
        "number" => {
            check_arity(name, &args, 0..=1)?;
            match args.first() {
                Some(v) => XPathValue::Number(v.to_number()),
                None => XPathValue::Number(parse_number(&e_ctx.context_node.string_value())),
            }
        }
        "sum" => {
            check_arity(name, &args, 1..=1)?;
            match &args[0] {
                XPathValue::NodeSet(nodes) => XPathValue::Number(
                    nodes.iter().map(|n| parse_number(&n.string_value())).sum(),
                ),
                other => {
                    return Err(XPathError::TypeError(format!(
                        "sum() argument must be a node-set, got {}",
                        other.type_name()
                    )));
                }
            }
        }
        "floor" | "ceiling" | "round" => {
            check_arity(name, &args, 1..=1)?;
            let n = args[0].to_number();
            XPathValue::Number(match name {
                "floor" => n.floor(),
                "ceiling" => n.ceil(),
                // Halves round towards positive infinity.
                _ if n.is_nan() || n.is_infinite() => n,
                _ => (n + 0.5).floor(),
            })
        }
        _ => {
            return Err(XPathError::FunctionError {
                function: name.to_string(),
                message: "Function is registered but has no implementation".to_string(),
            });
        }
    };
    Ok(value)
}

/// `substring(s, start, len?)` with XPath's 1-based, rounded positions.
fn substring<'a, N: DataSourceNode<'a>>(args: Vec<XPathValue<N>>) -> XPathValue<N> {
    let s = args[0].to_string();
    let round = |n: f64| (n + 0.5).floor();
    let start = round(args[1].to_number());
    let end = match args.get(2) {
        Some(len) => start + round(len.to_number()),
        None => f64::INFINITY,
    };
    if start.is_nan() || end.is_nan() {
        return XPathValue::String(String::new());
    }
    let result = s
        .chars()
        .enumerate()
        .filter(|(i, _)| {
            let pos = (*i + 1) as f64;
            pos >= start && pos < end
        })
        .map(|(_, c)| c)
        .collect();
    XPathValue::String(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::mock::{MockNode, MockTree, create_test_tree, test_namespaces};
    use crate::engine::evaluate;
    use crate::parser::parse_expression;
    use std::collections::HashMap;

    fn eval_str(tree: &MockTree, expr: &str) -> String {
        let funcs = FunctionRegistry::default();
        let vars: HashMap<String, XPathValue<MockNode<'_>>> = HashMap::new();
        let ns = test_namespaces();
        let e_ctx = EvaluationContext::new(tree.node(0), &funcs, &vars, &ns);
        evaluate(&parse_expression(expr).unwrap(), &e_ctx)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_string_functions() {
        let tree = create_test_tree();
        assert_eq!(eval_str(&tree, "concat('a', 'b', 1)"), "ab1");
        assert_eq!(eval_str(&tree, "substring('12345', 2, 3)"), "234");
        assert_eq!(eval_str(&tree, "substring('12345', 1.5, 2.6)"), "234");
        assert_eq!(eval_str(&tree, "substring('12345', 2)"), "2345");
        assert_eq!(eval_str(&tree, "substring-before('1999/04/01', '/')"), "1999");
        assert_eq!(eval_str(&tree, "substring-after('1999/04/01', '/')"), "04/01");
        assert_eq!(eval_str(&tree, "normalize-space('  a \n b  ')"), "a b");
        assert_eq!(eval_str(&tree, "translate('--aaa--', 'abc-', 'ABC')"), "AAA");
        assert_eq!(eval_str(&tree, "string-length('four')"), "4");
    }

    #[test]
    fn test_name_functions() {
        let tree = create_test_tree();
        assert_eq!(eval_str(&tree, "local-name(/o:order)"), "order");
        assert_eq!(eval_str(&tree, "namespace-uri(//o:item)"), "urn:orders");
        assert_eq!(eval_str(&tree, "namespace-uri(//memo)"), "");
        assert_eq!(eval_str(&tree, "name(//@sku)"), "sku");
    }

    #[test]
    fn test_numeric_and_boolean_functions() {
        let tree = create_test_tree();
        assert_eq!(eval_str(&tree, "round(2.5)"), "3");
        assert_eq!(eval_str(&tree, "round(-2.5)"), "-2");
        assert_eq!(eval_str(&tree, "floor(2.7)"), "2");
        assert_eq!(eval_str(&tree, "ceiling(2.1)"), "3");
        assert_eq!(eval_str(&tree, "number('x')"), "NaN");
        assert_eq!(eval_str(&tree, "not(//missing)"), "true");
        assert_eq!(eval_str(&tree, "boolean(//memo)"), "true");
    }

    #[test]
    fn test_arity_is_checked() {
        let tree = create_test_tree();
        let funcs = FunctionRegistry::default();
        let vars: HashMap<String, XPathValue<MockNode<'_>>> = HashMap::new();
        let ns = test_namespaces();
        let e_ctx = EvaluationContext::new(tree.node(0), &funcs, &vars, &ns);
        let err = evaluate(&parse_expression("count()").unwrap(), &e_ctx).unwrap_err();
        assert!(matches!(err, XPathError::FunctionError { .. }));
    }

    #[test]
    fn test_unregistered_function_is_rejected() {
        let tree = create_test_tree();
        let mut funcs = FunctionRegistry::new();
        funcs.register("count");
        let vars: HashMap<String, XPathValue<MockNode<'_>>> = HashMap::new();
        let ns = test_namespaces();
        let e_ctx = EvaluationContext::new(tree.node(0), &funcs, &vars, &ns);
        assert!(evaluate(&parse_expression("string(//memo)").unwrap(), &e_ctx).is_err());
        assert!(evaluate(&parse_expression("count(//memo)").unwrap(), &e_ctx).is_ok());
    }
}
