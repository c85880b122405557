//! Structured message validation for XML and JSON payloads.
//!
//! A received message is compared against a control message under ignore rules,
//! placeholders and dynamic content, optionally followed by independent path assertions.
//!
//! ```no_run
//! use verity::{Bindings, Message, XmlMessageValidator, XmlValidationConfig};
//!
//! let bindings = Bindings::new().with_variable("id", "1");
//! let config = XmlValidationConfig::new().with_path_assertion("//msg/id", Some("${id}"));
//! let received = Message::new("<msg><id>1</id><val>999</val></msg>");
//! let control = Message::new("<msg><id>${id}</id><val>@ignore@</val></msg>");
//!
//! XmlMessageValidator::new(&bindings).validate(&received, Some(&control), &config)?;
//! # Ok::<(), verity::ValidationError>(())
//! ```

pub mod config;
pub mod error;
pub mod ignore;
pub mod path;
pub mod resolver;
pub mod validation;

pub use config::{DEFAULT_PLACEHOLDER, JsonValidationConfig, ValidatorConfig, XmlValidationConfig};
pub use error::{MismatchKind, ValidationError};
pub use ignore::IgnoreRules;
pub use path::{Lookup, PathEvaluator, ResultKind, is_path_expression};
pub use resolver::{Bindings, DynamicContent, FunctionRegistry, ResolveError, TestFunction};
pub use validation::{
    JsonComparator, JsonMessageValidator, Message, SchemaRegistry, SchemaRepository,
    XmlMessageValidator, XmlSchema, XmlTreeComparator,
};

pub use verity_xml::{NamespaceContext, ParseOptions, XmlDocument, XmlNode};
