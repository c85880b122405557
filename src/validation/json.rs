//! JSON comparison: objects are unordered by key, arrays are ordered and length-exact.

use crate::error::{MismatchKind, Result, ValidationError};
use log::debug;
use serde_json::{Map, Value};

/// Path segments are joined as `a.b` for object keys and `a[0]` for array elements.
fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "$" } else { path }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub struct JsonComparator<'a> {
    placeholder: &'a str,
}

impl<'a> JsonComparator<'a> {
    pub fn new(placeholder: &'a str) -> Self {
        Self { placeholder }
    }

    pub fn compare(&self, received: &Value, control: &Value) -> Result<()> {
        self.compare_values(received, control, "")
    }

    fn compare_objects(
        &self,
        received: &Map<String, Value>,
        control: &Map<String, Value>,
        path: &str,
    ) -> Result<()> {
        if received.len() != control.len() {
            return Err(ValidationError::mismatch(
                MismatchKind::EntryCount,
                display_path(path),
                control.len(),
                received.len(),
            ));
        }

        for (key, expected) in control {
            let entry_path = child_path(path, key);
            let Some(actual) = received.get(key) else {
                return Err(ValidationError::mismatch(
                    MismatchKind::MissingEntry,
                    entry_path,
                    key,
                    "",
                ));
            };
            self.compare_values(actual, expected, &entry_path)?;
        }
        Ok(())
    }

    fn compare_values(&self, received: &Value, control: &Value, path: &str) -> Result<()> {
        match control {
            Value::String(s) if s.trim() == self.placeholder => {
                debug!(
                    "JSON entry: '{}' is ignored - skip value validation",
                    display_path(path)
                );
                return Ok(());
            }
            Value::Object(expected) => {
                let Value::Object(actual) = received else {
                    return Err(self.type_mismatch(received, control, path));
                };
                self.compare_objects(actual, expected, path)?;
            }
            Value::Array(expected) => {
                let Value::Array(actual) = received else {
                    return Err(self.type_mismatch(received, control, path));
                };
                debug!("Validating JSON array containing {} entries", expected.len());
                if actual.len() != expected.len() {
                    return Err(ValidationError::mismatch(
                        MismatchKind::ArraySize,
                        display_path(path),
                        expected.len(),
                        actual.len(),
                    ));
                }
                for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
                    self.compare_values(a, e, &format!("{}[{}]", path, i))?;
                }
            }
            scalar => {
                if received != scalar {
                    return Err(ValidationError::mismatch(
                        MismatchKind::Value,
                        display_path(path),
                        scalar,
                        received,
                    ));
                }
            }
        }
        debug!(
            "Validation successful for JSON entry '{}'",
            display_path(path)
        );
        Ok(())
    }

    fn type_mismatch(&self, received: &Value, control: &Value, path: &str) -> ValidationError {
        ValidationError::mismatch(
            MismatchKind::EntryType,
            display_path(path),
            type_name(control),
            type_name(received),
        )
    }
}
