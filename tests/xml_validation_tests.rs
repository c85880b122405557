mod common;

use common::fixtures::{NUMBERS, ORDER, ORDER_CONTROL};
use common::{TestResult, bindings, init_logger, message};
use verity::{
    Bindings, MismatchKind, SchemaRegistry, ValidationError, XmlDocument, XmlMessageValidator,
    XmlSchema, XmlValidationConfig,
};

fn validate(
    received: &str,
    control: &str,
    config: &XmlValidationConfig,
) -> Result<(), ValidationError> {
    init_logger();
    let bindings = bindings();
    XmlMessageValidator::new(&bindings).validate(
        &message(received),
        Some(&message(control)),
        config,
    )
}

fn kind_of(result: Result<(), ValidationError>) -> Option<MismatchKind> {
    result.err().and_then(|e| e.kind())
}

#[test]
fn test_placeholder_element_matches_any_value() -> TestResult {
    validate(
        "<msg><id>1</id><val>999</val></msg>",
        "<msg><id>1</id><val>@ignore@</val></msg>",
        &XmlValidationConfig::default(),
    )?;
    Ok(())
}

#[test]
fn test_text_mismatch_names_the_element() {
    let err = validate(
        "<msg><id>2</id></msg>",
        "<msg><id>1</id></msg>",
        &XmlValidationConfig::default(),
    )
    .unwrap_err();
    assert!(err.is_mismatch());
    match err {
        ValidationError::StructuralMismatch {
            kind,
            path,
            expected,
            actual,
        } => {
            assert_eq!(kind, MismatchKind::NodeValue);
            assert_eq!(path, "msg.id");
            assert_eq!(expected, "1");
            assert_eq!(actual, "2");
        }
        other => panic!("expected a structural mismatch, got {:?}", other),
    }
}

#[test]
fn test_realistic_order_with_variables_placeholders_and_comments() -> TestResult {
    validate(ORDER, ORDER_CONTROL, &XmlValidationConfig::default())?;
    Ok(())
}

#[test]
fn test_whitespace_nodes_count_when_not_stripped() {
    let config = XmlValidationConfig::default().with_strip_whitespace(false);
    assert_eq!(
        kind_of(validate(ORDER, ORDER_CONTROL, &config)),
        Some(MismatchKind::ChildCount)
    );
}

#[test]
fn test_placeholder_subtree_is_skipped_but_sibling_count_is_not() {
    let config = XmlValidationConfig::default();
    assert!(validate("<a><b>anything<c/></b></a>", "<a><b>@ignore@</b></a>", &config).is_ok());
    assert_eq!(
        kind_of(validate("<a><b>x</b><b>y</b></a>", "<a><b>@ignore@</b></a>", &config)),
        Some(MismatchKind::ChildCount)
    );
}

#[test]
fn test_full_path_ignore_leaves_same_named_sibling_compared() {
    let control = NUMBERS.replace("030", "999").replace("040", "888");

    let only_first = XmlValidationConfig::default()
        .with_ignore_expression("Numbers.Numbers1.NumberItem.AreaCode");
    let err = validate(NUMBERS, &control, &only_first).unwrap_err();
    match err {
        ValidationError::StructuralMismatch { path, .. } => {
            assert_eq!(path, "Numbers.Numbers2.NumberItem.AreaCode")
        }
        other => panic!("expected a structural mismatch, got {:?}", other),
    }

    let both = only_first.with_ignore_expression("//Numbers2/NumberItem/AreaCode");
    assert!(validate(NUMBERS, &control, &both).is_ok());
}

#[test]
fn test_short_name_ignore_hits_first_match_only() {
    let control = NUMBERS.replace("030", "999");
    let config = XmlValidationConfig::default().with_ignore_expression("AreaCode");
    assert!(validate(NUMBERS, &control, &config).is_ok());

    let control = NUMBERS.replace("040", "999");
    assert_eq!(
        kind_of(validate(NUMBERS, &control, &config)),
        Some(MismatchKind::NodeValue)
    );
}

#[test]
fn test_prefixed_ignore_expression_uses_configured_namespaces() -> TestResult {
    let control = ORDER_CONTROL.replace("${customer}", "SOMEONE ELSE");
    let config = XmlValidationConfig::default()
        .with_namespace("x", "urn:example:orders")
        .with_ignore_expression("//x:customer");
    validate(ORDER, &control, &config)?;
    Ok(())
}

#[test]
fn test_element_count_mismatch_fails_even_if_present_children_match() {
    assert_eq!(
        kind_of(validate(
            "<root><a>1</a></root>",
            "<root><a>1</a><a>1</a></root>",
            &XmlValidationConfig::default()
        )),
        Some(MismatchKind::ChildCount)
    );
}

#[test]
fn test_path_assertions() -> TestResult {
    let received = "<msg><id>1</id></msg>";
    let config = XmlValidationConfig::default().with_path_assertion("//msg/id", Some("1"));
    validate(received, "", &config)?;

    let err = validate("<msg><id>2</id></msg>", "", &config).unwrap_err();
    assert_eq!(err.kind(), Some(MismatchKind::NodeValue));
    Ok(())
}

#[test]
fn test_path_assertions_without_control_message() -> TestResult {
    init_logger();
    let bindings = bindings();
    let config = XmlValidationConfig::default()
        .with_namespace("o", "urn:example:orders")
        .with_path_assertion("//o:customer", Some("${customer}"))
        .with_path_assertion("number:count(//o:item)", Some("2"))
        .with_path_assertion("node-set://o:item/@sku", Some("A-1,B-7"))
        .with_path_assertion("order.items.item.sku", Some("A-1"))
        .with_path_assertion("//o:order/@id", Some("core:concat('47', '11')"));
    XmlMessageValidator::new(&bindings).validate(&message(ORDER), None, &config)?;

    let missing = XmlValidationConfig::default().with_path_assertion("//nothing", Some("x"));
    let err = XmlMessageValidator::new(&bindings)
        .validate(&message(ORDER), None, &missing)
        .unwrap_err();
    assert!(matches!(err, ValidationError::UnknownElement(_)));
    Ok(())
}

#[test]
fn test_control_namespaces() {
    let expected = XmlValidationConfig::default()
        .with_control_namespace("ord", "urn:example:orders")
        .with_control_namespace("", "urn:example:common");
    assert!(validate(ORDER, "", &expected).is_ok());

    let wrong = XmlValidationConfig::default()
        .with_control_namespace("ord", "urn:example:other")
        .with_control_namespace("", "urn:example:common");
    assert_eq!(
        kind_of(validate(ORDER, "", &wrong)),
        Some(MismatchKind::NamespaceValue)
    );

    assert!(matches!(
        validate("", "", &expected),
        Err(ValidationError::EmptyPayloadMismatch(_))
    ));
}

#[test]
fn test_headers_use_dynamic_values() {
    init_logger();
    let bindings = Bindings::new().with_variable("op", "placeOrder");
    let validator = XmlMessageValidator::new(&bindings);
    let config = XmlValidationConfig::default();
    let received = message("<a/>").with_header("operation", "placeOrder");

    let control = message("<a/>").with_header("operation", "${op}");
    assert!(validator.validate(&received, Some(&control), &config).is_ok());

    let control = message("<a/>").with_header("correlationId", "@ignore@");
    assert_eq!(
        kind_of(validator.validate(&received, Some(&control), &config)),
        Some(MismatchKind::MissingHeader)
    );
}

struct RootMustHaveId;

impl XmlSchema for RootMustHaveId {
    fn validate(&self, doc: &XmlDocument) -> Vec<String> {
        match doc.document_element() {
            Some(root) if root.attribute("id", None).is_some() => Vec::new(),
            _ => vec!["attribute 'id' is required".to_string()],
        }
    }
}

#[test]
fn test_schema_stage_runs_first() {
    init_logger();
    let bindings = bindings();
    let mut registry = SchemaRegistry::new();
    registry.register("urn:example:orders", Box::new(RootMustHaveId));
    let validator = XmlMessageValidator::new(&bindings).with_schema_repository(&registry);

    let invalid = r#"<o:order xmlns:o="urn:example:orders"/>"#;
    let err = validator
        .validate(
            &message(invalid),
            Some(&message("<other/>")),
            &XmlValidationConfig::default(),
        )
        .unwrap_err();
    assert!(matches!(err, ValidationError::SchemaViolation(_)));

    let disabled = XmlValidationConfig::default().with_schema_validation(false);
    assert_eq!(
        kind_of(validator.validate(&message(invalid), Some(&message("<other/>")), &disabled)),
        Some(MismatchKind::ElementName)
    );
}

#[test]
fn test_engine_errors_are_not_mismatches() {
    let err = validate("<msg>", "<msg/>", &XmlValidationConfig::default()).unwrap_err();
    assert!(matches!(err, ValidationError::Xml(_)));
    assert!(!err.is_mismatch());

    let config = XmlValidationConfig::default().with_ignore_expression("//msg[");
    let err = validate("<msg/>", "<msg/>", &config).unwrap_err();
    assert!(matches!(err, ValidationError::Configuration(_)));

    let err = validate("<msg/>", "<msg>${unknown}</msg>", &XmlValidationConfig::default())
        .unwrap_err();
    assert!(matches!(err, ValidationError::Configuration(_)));
}
