//! Tests for parameter schema validation.

use super::*;
use crate::plugin::{Plugin, PluginCategory};
use proptest::prelude::*;
use serde_json::json;

fn raw(value: Value) -> RawParams {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

fn create_schema() -> ParamSchema {
    ParamSchema::new()
        .field(
            ParamSpec::new("threshold", ParamType::Float)
                .default_value(0.8)
                .between(0.0, 1.0),
        )
        .field(
            ParamSpec::new("limit", ParamType::Integer)
                .default_value(5_i64)
                .between(1.0, 100.0),
        )
        .field(
            ParamSpec::new("mode", ParamType::String)
                .default_value("must_match")
                .one_of(&["must_match", "must_not_match"]),
        )
        .field(ParamSpec::new("pattern", ParamType::Regex).required())
        .field(ParamSpec::new("case_insensitive", ParamType::Bool).default_value(false))
        .field(ParamSpec::new("upper", ParamType::Float))
}

#[test]
fn test_defaults_applied() {
    let params = create_schema()
        .validate(&raw(json!({"pattern": "^a"})), ValidationMode::Lenient)
        .unwrap();

    assert_eq!(params.float("threshold").unwrap(), 0.8);
    assert_eq!(params.int("limit").unwrap(), 5);
    assert_eq!(params.str("mode").unwrap(), "must_match");
    assert!(!params.bool("case_insensitive").unwrap());
    assert_eq!(params.opt_float("upper").unwrap(), None);
    assert_eq!(params.len(), 5);
}

#[test]
fn test_missing_required() {
    let err = create_schema()
        .validate(&RawParams::new(), ValidationMode::Lenient)
        .unwrap_err();
    assert_eq!(
        err,
        ParamError::MissingRequired {
            field: "pattern".into()
        }
    );
}

#[test]
fn test_null_treated_as_absent() {
    let params = create_schema()
        .validate(
            &raw(json!({"pattern": "x", "threshold": null})),
            ValidationMode::Lenient,
        )
        .unwrap();
    assert_eq!(params.float("threshold").unwrap(), 0.8);

    let err = create_schema()
        .validate(&raw(json!({"pattern": null})), ValidationMode::Lenient)
        .unwrap_err();
    assert_eq!(err.field(), "pattern");
}

#[test]
fn test_numeric_coercion() {
    let params = create_schema()
        .validate(
            &raw(json!({"pattern": "x", "threshold": 1, "limit": 7.0})),
            ValidationMode::Lenient,
        )
        .unwrap();
    assert_eq!(params.get("threshold"), Some(&ParamValue::Float(1.0)));
    assert_eq!(params.get("limit"), Some(&ParamValue::Int(7)));
}

#[test]
fn test_type_errors() {
    let schema = create_schema();
    let cases = [
        json!({"pattern": "x", "threshold": "0.5"}),
        json!({"pattern": "x", "limit": 2.5}),
        json!({"pattern": "x", "case_insensitive": "yes"}),
        json!({"pattern": 12}),
    ];

    for case in cases {
        let err = schema
            .validate(&raw(case.clone()), ValidationMode::Lenient)
            .unwrap_err();
        assert!(
            matches!(err, ParamError::Type { .. }),
            "expected type error for {}, got {:?}",
            case,
            err
        );
    }
}

#[test]
fn test_range_errors() {
    let schema = create_schema();
    let cases = [
        (json!({"pattern": "x", "threshold": 1.5}), "threshold"),
        (json!({"pattern": "x", "limit": 0}), "limit"),
        (json!({"pattern": "x", "mode": "sometimes"}), "mode"),
        (json!({"pattern": "(unclosed"}), "pattern"),
    ];

    for (case, field) in cases {
        let err = schema.validate(&raw(case), ValidationMode::Lenient).unwrap_err();
        assert!(matches!(err, ParamError::Range { .. }), "got {:?}", err);
        assert_eq!(err.field(), field);
    }
}

#[test]
fn test_inclusive_bounds() {
    let schema = create_schema();
    for threshold in [0.0, 1.0] {
        let params = schema
            .validate(
                &raw(json!({"pattern": "x", "threshold": threshold})),
                ValidationMode::Lenient,
            )
            .unwrap();
        assert_eq!(params.float("threshold").unwrap(), threshold);
    }
}

#[test]
fn test_unknown_keys_by_mode() {
    let input = raw(json!({"pattern": "x", "colour": "blue"}));

    let lenient = create_schema().validate(&input, ValidationMode::Lenient).unwrap();
    assert!(lenient.get("colour").is_none());

    let err = create_schema()
        .validate(&input, ValidationMode::Strict)
        .unwrap_err();
    assert_eq!(
        err,
        ParamError::Unknown {
            field: "colour".into()
        }
    );
}

#[test]
fn test_float_list_constraints() {
    let schema = ParamSchema::new().field(
        ParamSpec::new("quantiles", ParamType::FloatList)
            .default_value(vec![0.25, 0.5, 0.75])
            .between(0.0, 1.0)
            .non_empty(),
    );

    let params = schema.validate(&RawParams::new(), ValidationMode::Lenient).unwrap();
    assert_eq!(params.float_list("quantiles").unwrap(), &[0.25, 0.5, 0.75]);

    let params = schema
        .validate(&raw(json!({"quantiles": [0, 1]})), ValidationMode::Lenient)
        .unwrap();
    assert_eq!(params.float_list("quantiles").unwrap(), &[0.0, 1.0]);

    let err = schema
        .validate(&raw(json!({"quantiles": []})), ValidationMode::Lenient)
        .unwrap_err();
    assert!(matches!(err, ParamError::Range { .. }));

    let err = schema
        .validate(&raw(json!({"quantiles": [0.5, 1.2]})), ValidationMode::Lenient)
        .unwrap_err();
    assert!(matches!(err, ParamError::Range { .. }));

    let err = schema
        .validate(&raw(json!({"quantiles": [0.5, "x"]})), ValidationMode::Lenient)
        .unwrap_err();
    assert!(matches!(err, ParamError::Type { .. }));
}

#[test]
fn test_accessor_type_mismatch() {
    let params = Params::new().with("limit", 3_i64).with("name", "x");
    assert_eq!(params.float("limit").unwrap(), 3.0);
    assert!(params.bool("limit").is_err());
    assert!(params.int("name").is_err());
    assert!(matches!(
        params.str("missing"),
        Err(ParamError::MissingRequired { .. })
    ));
}

#[test]
fn test_schema_serializes_for_documentation() {
    let json = serde_json::to_value(create_schema()).unwrap();
    let fields = json["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 6);
    assert_eq!(fields[0]["name"], "threshold");
    assert_eq!(fields[0]["type"], "float");
    assert_eq!(fields[0]["default"], 0.8);
    assert_eq!(fields[0]["constraints"][0]["constraint"], "range");
    assert_eq!(fields[3]["required"], true);
}

#[test]
fn test_validation_is_deterministic() {
    let input = raw(json!({"pattern": "[0-9]+", "limit": 9}));
    let first = create_schema().validate(&input, ValidationMode::Strict).unwrap();
    let second = create_schema().validate(&input, ValidationMode::Strict).unwrap();
    assert_eq!(first, second);
}

proptest! {
    #[test]
    fn prop_revalidation_is_noop(
        threshold in proptest::option::of(0.0f64..=1.0),
        limit in proptest::option::of(1i64..=100),
        insensitive in proptest::option::of(any::<bool>()),
        must_match in any::<bool>(),
        upper in proptest::option::of(-1.0e6f64..1.0e6),
    ) {
        let mut input = RawParams::new();
        input.insert("pattern".into(), json!("^[a-z]+$"));
        input.insert("mode".into(), json!(if must_match { "must_match" } else { "must_not_match" }));
        if let Some(t) = threshold {
            input.insert("threshold".into(), json!(t));
        }
        if let Some(l) = limit {
            input.insert("limit".into(), json!(l));
        }
        if let Some(b) = insensitive {
            input.insert("case_insensitive".into(), json!(b));
        }
        if let Some(u) = upper {
            input.insert("upper".into(), json!(u));
        }

        let schema = create_schema();
        let first = schema.validate(&input, ValidationMode::Strict).unwrap();
        let second = schema.validate(&first.to_raw(), ValidationMode::Strict).unwrap();
        prop_assert_eq!(first, second);
    }
}

fn raw_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        (-1_000i64..1_000).prop_map(Value::from),
        (-1_000.0f64..1_000.0).prop_map(Value::from),
        proptest::sample::select(vec!["must_match", "must_not_match", "^[a-z]+$", " \t", "[", ""])
            .prop_map(Value::from),
        proptest::collection::vec(0.0f64..=1.0, 0..4).prop_map(|q| json!(q)),
    ]
}

proptest! {
    #[test]
    fn prop_builtin_revalidation_is_noop(
        index in 0..crate::plugins::builtin_constructors().len(),
        values in proptest::collection::vec(proptest::option::of(raw_value()), 4),
    ) {
        let plugin = crate::plugins::builtin_constructors()[index]();
        let mut input = RawParams::new();
        for (spec, value) in plugin.parameter_schema().fields().iter().zip(&values) {
            if let Some(value) = value {
                input.insert(spec.name.to_string(), value.clone());
            }
        }

        if let Ok(first) = plugin.validate_params(&input, ValidationMode::Strict) {
            let second = plugin.validate_params(&first.to_raw(), ValidationMode::Strict);
            prop_assert_eq!(Ok(first), second, "plugin {}", plugin.name());
        }
    }

    #[test]
    fn prop_numeric_range_revalidation_is_noop(
        greater_than in proptest::option::of(-1.0e6f64..1.0e6),
        less_than in proptest::option::of(-1.0e6f64..1.0e6),
    ) {
        let registry = crate::registry::Registry::with_builtins().unwrap();
        let plugin = registry.instantiate(PluginCategory::Check, "numeric_range").unwrap();
        let mut input = RawParams::new();
        if let Some(min) = greater_than {
            input.insert("greater_than".into(), json!(min));
        }
        if let Some(max) = less_than {
            input.insert("less_than".into(), json!(max));
        }

        let accepted = match (greater_than, less_than) {
            (None, None) => false,
            (Some(min), Some(max)) => min < max,
            _ => true,
        };
        let first = plugin.validate_params(&input, ValidationMode::Strict);
        prop_assert_eq!(first.is_ok(), accepted);
        if let Ok(first) = first {
            let second = plugin.validate_params(&first.to_raw(), ValidationMode::Strict);
            prop_assert_eq!(Ok(first), second);
        }
    }
}
