//! Dynamic content: `${variable}` references and `library:function(...)` calls embedded in
//! expected values and path expressions.
//!
//! The engine only consumes the [`DynamicContent`] trait. [`Bindings`] is an in-memory
//! implementation backed by a variable map and a [`FunctionRegistry`].

pub mod functions;
pub mod parser;

pub use functions::{FunctionRegistry, TestFunction};

use parser::{Argument, FunctionCall, parse_function_call, parse_leading_call};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Malformed function call {0}")]
    MalformedCall(String),

    #[error("Function '{function}' failed: {message}")]
    FunctionFailed { function: String, message: String },
}

const VARIABLE_PREFIX: &str = "${";
const VARIABLE_SUFFIX: &str = "}";

/// Read-only lookup of variables and functions for one validation call. Implementations are
/// shared by concurrent validations.
pub trait DynamicContent: Sync {
    /// Replaces every variable reference and function call embedded in `text`.
    fn replace_dynamic_content(&self, text: &str) -> Result<String, ResolveError>;

    /// Whether `expr` as a whole is a variable reference such as `${id}`.
    fn is_variable_name(&self, expr: &str) -> bool {
        expr.starts_with(VARIABLE_PREFIX) && expr.ends_with(VARIABLE_SUFFIX)
    }

    /// The value of a variable reference `${name}`.
    fn variable(&self, expr: &str) -> Result<String, ResolveError>;

    /// Whether `expr` as a whole is a call into a known function library.
    fn is_function(&self, expr: &str) -> bool;

    fn resolve_function(&self, expr: &str) -> Result<String, ResolveError>;

    /// Resolves an expected value: a variable reference, else a function call, else the
    /// literal itself.
    fn resolve_value(&self, expr: &str) -> Result<String, ResolveError> {
        if self.is_variable_name(expr) {
            self.variable(expr)
        } else if self.is_function(expr) {
            self.resolve_function(expr)
        } else {
            Ok(expr.to_string())
        }
    }
}

/// Variables and functions available to a validation call.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    variables: BTreeMap<String, String>,
    functions: FunctionRegistry,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.variables.extend(variables);
        self
    }

    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    fn lookup(&self, name: &str) -> Result<String, ResolveError> {
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError::UnknownVariable(name.to_string()))
    }

    fn replace_variables(&self, text: &str) -> Result<String, ResolveError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find(VARIABLE_PREFIX) {
            let after = &rest[start + VARIABLE_PREFIX.len()..];
            let Some(end) = after.find(VARIABLE_SUFFIX) else {
                break;
            };
            out.push_str(&rest[..start]);
            out.push_str(&self.lookup(&after[..end])?);
            rest = &after[end + VARIABLE_SUFFIX.len()..];
        }
        out.push_str(rest);
        Ok(out)
    }

    fn replace_functions(&self, text: &str) -> Result<String, ResolveError> {
        let prefixes = self.functions.library_prefixes();
        if prefixes.is_empty() {
            return Ok(text.to_string());
        }
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        loop {
            let next = prefixes
                .iter()
                .filter_map(|p| find_call_start(rest, p))
                .min();
            let Some(start) = next else {
                break;
            };
            match parse_leading_call(&rest[start..]) {
                Some((remainder, call)) => {
                    out.push_str(&rest[..start]);
                    out.push_str(&self.call(&call)?);
                    rest = remainder;
                }
                None => {
                    // Not a call after all: keep the text up to and including the prefix.
                    let skip = start + rest[start..].find(':').map_or(1, |i| i + 1);
                    out.push_str(&rest[..skip]);
                    rest = &rest[skip..];
                }
            }
        }
        out.push_str(rest);
        Ok(out)
    }

    fn call(&self, call: &FunctionCall) -> Result<String, ResolveError> {
        let func = self
            .functions
            .get(&call.name)
            .ok_or_else(|| ResolveError::UnknownFunction(call.name.clone()))?;
        let args = call
            .args
            .iter()
            .map(|arg| match arg {
                Argument::Literal(s) => Ok(s.clone()),
                Argument::Call(inner) => self.call(inner),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let result = func(&args)?;
        log::debug!("Resolved function '{}' to '{}'", call.name, result);
        Ok(result)
    }
}

/// The first position of `prefix` in `text` that starts a name rather than continuing one.
fn find_call_start(text: &str, prefix: &str) -> Option<usize> {
    text.match_indices(prefix).map(|(i, _)| i).find(|&i| {
        text[..i]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_' || c == '-'))
    })
}

impl DynamicContent for Bindings {
    fn replace_dynamic_content(&self, text: &str) -> Result<String, ResolveError> {
        let replaced = self.replace_variables(text)?;
        self.replace_functions(&replaced)
    }

    fn variable(&self, expr: &str) -> Result<String, ResolveError> {
        let name = expr
            .strip_prefix(VARIABLE_PREFIX)
            .and_then(|s| s.strip_suffix(VARIABLE_SUFFIX))
            .unwrap_or(expr);
        self.lookup(name)
    }

    fn is_function(&self, expr: &str) -> bool {
        let expr = expr.trim();
        self.functions
            .library_prefixes()
            .iter()
            .any(|p| expr.starts_with(p.as_str()))
            && expr.ends_with(')')
    }

    fn resolve_function(&self, expr: &str) -> Result<String, ResolveError> {
        let call = parse_function_call(&self.replace_variables(expr)?)?;
        self.call(&call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings() -> Bindings {
        Bindings::new()
            .with_variable("id", "42")
            .with_variable("name", "verity")
    }

    #[test]
    fn test_variables_are_replaced_inline() {
        let b = bindings();
        assert_eq!(
            b.replace_dynamic_content("<id>${id}</id><n>${name}</n>").unwrap(),
            "<id>42</id><n>verity</n>"
        );
        assert_eq!(b.replace_dynamic_content("no refs").unwrap(), "no refs");
        assert_eq!(
            b.replace_dynamic_content("${missing}"),
            Err(ResolveError::UnknownVariable("missing".into()))
        );
        // An unterminated reference is left as written.
        assert_eq!(b.replace_dynamic_content("a ${b").unwrap(), "a ${b");
    }

    #[test]
    fn test_embedded_function_calls_are_replaced() {
        let b = bindings();
        assert_eq!(
            b.replace_dynamic_content("Hi core:upperCase('${name}')!").unwrap(),
            "Hi VERITY!"
        );
        assert_eq!(
            b.replace_dynamic_content("core:concat('a', core:lowerCase('B'))").unwrap(),
            "ab"
        );
        // A prefix in the middle of a word is not a call.
        assert_eq!(b.replace_dynamic_content("hardcore:x").unwrap(), "hardcore:x");
        assert_eq!(b.replace_dynamic_content("core: text").unwrap(), "core: text");
    }

    #[test]
    fn test_resolve_value_order() {
        let b = bindings();
        assert_eq!(b.resolve_value("${id}").unwrap(), "42");
        assert_eq!(b.resolve_value("core:stringLength('four')").unwrap(), "4");
        assert_eq!(b.resolve_value("plain").unwrap(), "plain");
        assert!(b.is_variable_name("${id}"));
        assert!(!b.is_variable_name("id"));
        assert!(b.is_function("core:trim(' a ')"));
        assert!(!b.is_function("other:trim(' a ')"));
    }

    #[test]
    fn test_unknown_function_in_known_library() {
        let b = bindings();
        assert_eq!(
            b.resolve_function("core:reverse('a')"),
            Err(ResolveError::UnknownFunction("core:reverse".into()))
        );
    }

    #[test]
    fn test_custom_functions_can_be_registered() {
        fn greet(args: &[String]) -> Result<String, ResolveError> {
            Ok(format!("hello {}", args.join(" ")))
        }
        let mut b = bindings();
        b.functions_mut().register("my", "greet", greet);
        assert_eq!(b.resolve_value("my:greet('you')").unwrap(), "hello you");
    }
}
