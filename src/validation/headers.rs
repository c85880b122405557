use crate::error::{MismatchKind, Result, ValidationError};
use crate::resolver::DynamicContent;
use log::{debug, info};
use std::collections::BTreeMap;

/// Checks every control header against the received headers. Received headers the control
/// message does not name are accepted.
pub fn validate_headers(
    control: &BTreeMap<String, String>,
    received: &BTreeMap<String, String>,
    resolver: &dyn DynamicContent,
    placeholder: &str,
) -> Result<()> {
    if control.is_empty() {
        return Ok(());
    }
    info!("Start message header validation");

    for (name, raw_expected) in control {
        let expected = resolver.resolve_value(raw_expected)?;
        let Some(actual) = received.get(name) else {
            return Err(ValidationError::mismatch(
                MismatchKind::MissingHeader,
                name,
                expected,
                "",
            ));
        };
        if expected.trim() == placeholder {
            debug!("Header '{}' is ignored by placeholder", name);
            continue;
        }
        if *actual != expected {
            return Err(ValidationError::mismatch(
                MismatchKind::HeaderValue,
                name,
                expected,
                actual,
            ));
        }
        debug!("Validating header element: {}='{}': OK.", name, expected);
    }

    info!("Validation of message headers finished successfully: All properties OK");
    Ok(())
}
