//! Defines the registry and built-in implementations for test functions.

use super::ResolveError;
use std::collections::{BTreeMap, BTreeSet};

/// The signature for a function implementation. Arguments arrive fully resolved.
pub type TestFunction = fn(args: &[String]) -> Result<String, ResolveError>;

/// A registry of functions keyed by `library:name`.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, TestFunction>,
}

impl FunctionRegistry {
    /// Creates a new, empty function registry.
    pub fn new() -> Self {
        Self {
            functions: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, library: &str, name: &str, func: TestFunction) {
        self.functions.insert(format!("{}:{}", library, name), func);
    }

    pub fn get(&self, name: &str) -> Option<&TestFunction> {
        self.functions.get(name)
    }

    /// The library prefixes in use, each including its trailing `:`.
    pub fn library_prefixes(&self) -> BTreeSet<String> {
        self.functions
            .keys()
            .filter_map(|name| name.split_once(':'))
            .map(|(library, _)| format!("{}:", library))
            .collect()
    }
}

impl Default for FunctionRegistry {
    /// A registry with the `core` library.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("core", "concat", concat);
        registry.register("core", "upperCase", upper_case);
        registry.register("core", "lowerCase", lower_case);
        registry.register("core", "stringLength", string_length);
        registry.register("core", "substring", substring);
        registry.register("core", "trim", trim);
        registry
    }
}

fn failed(function: &str, message: impl Into<String>) -> ResolveError {
    ResolveError::FunctionFailed {
        function: function.to_string(),
        message: message.into(),
    }
}

fn single<'a>(function: &str, args: &'a [String]) -> Result<&'a str, ResolveError> {
    match args {
        [arg] => Ok(arg.as_str()),
        _ => Err(failed(
            function,
            format!("Expected 1 argument, got {}", args.len()),
        )),
    }
}

// --- Built-in Function Implementations ---

fn concat(args: &[String]) -> Result<String, ResolveError> {
    Ok(args.concat())
}

fn upper_case(args: &[String]) -> Result<String, ResolveError> {
    single("core:upperCase", args).map(str::to_uppercase)
}

fn lower_case(args: &[String]) -> Result<String, ResolveError> {
    single("core:lowerCase", args).map(str::to_lowercase)
}

fn string_length(args: &[String]) -> Result<String, ResolveError> {
    single("core:stringLength", args).map(|s| s.chars().count().to_string())
}

fn trim(args: &[String]) -> Result<String, ResolveError> {
    single("core:trim", args).map(|s| s.trim().to_string())
}

/// `substring(text, begin[, end])` with zero-based character indices, `end` exclusive.
fn substring(args: &[String]) -> Result<String, ResolveError> {
    const NAME: &str = "core:substring";
    let (text, begin, end) = match args {
        [text, begin] => (text, begin, None),
        [text, begin, end] => (text, begin, Some(end)),
        _ => {
            return Err(failed(
                NAME,
                format!("Expected 2 or 3 arguments, got {}", args.len()),
            ));
        }
    };
    let index = |s: &str| {
        s.trim()
            .parse::<usize>()
            .map_err(|_| failed(NAME, format!("Invalid index '{}'", s)))
    };
    let chars: Vec<char> = text.chars().collect();
    let begin = index(begin)?;
    let end = match end {
        Some(end) => index(end)?,
        None => chars.len(),
    };
    if begin > end || end > chars.len() {
        return Err(failed(
            NAME,
            format!("Range {}..{} is outside '{}'", begin, end, text),
        ));
    }
    Ok(chars[begin..end].iter().collect())
}
