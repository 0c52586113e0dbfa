//! Property-based tests for the property codec

use notion_typed::codec::{decode, encode};
use notion_typed::{PropertyType, ResolvedPropertyConfig};
use proptest::prelude::*;
use serde_json::{json, Value};

fn config(property_type: PropertyType) -> ResolvedPropertyConfig {
    ResolvedPropertyConfig::new("p", "field", "Field", property_type)
}

fn roundtrip(property_type: PropertyType, value: &Value) -> Value {
    let wire = encode(property_type, value).unwrap();
    decode(&config(property_type), wire.as_ref())
}

/// Writable scalar and list values decode back to what was encoded
#[test]
fn test_writable_values_roundtrip() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                any::<String>(),
                any::<i64>(),
                any::<bool>(),
                prop::collection::vec("[a-z]{1,8}", 0..5),
            ),
            |(text, number, flag, names)| {
                prop_assert_eq!(roundtrip(PropertyType::Title, &json!(text)), json!(text));
                prop_assert_eq!(roundtrip(PropertyType::RichText, &json!(text)), json!(text));
                prop_assert_eq!(roundtrip(PropertyType::Number, &json!(number)), json!(number));
                prop_assert_eq!(roundtrip(PropertyType::Checkbox, &json!(flag)), json!(flag));
                prop_assert_eq!(roundtrip(PropertyType::Url, &json!(text)), json!(text));
                prop_assert_eq!(
                    roundtrip(PropertyType::MultiSelect, &json!(names)),
                    json!(names)
                );
                prop_assert_eq!(roundtrip(PropertyType::People, &json!(names)), json!(names));
                Ok(())
            },
        )
        .unwrap();
}

/// Null never produces a wire payload, and absent wire values decode to the empty value
#[test]
fn test_null_is_omitted_for_every_type() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let types = vec![
        PropertyType::Title,
        PropertyType::RichText,
        PropertyType::Number,
        PropertyType::Select,
        PropertyType::MultiSelect,
        PropertyType::Status,
        PropertyType::Date,
        PropertyType::People,
        PropertyType::Files,
        PropertyType::Checkbox,
        PropertyType::Url,
        PropertyType::Email,
        PropertyType::PhoneNumber,
        PropertyType::Relation,
        PropertyType::Formula,
        PropertyType::Rollup,
        PropertyType::CreatedTime,
        PropertyType::CreatedBy,
        PropertyType::LastEditedTime,
        PropertyType::LastEditedBy,
        PropertyType::UniqueId,
    ];

    runner
        .run(&prop::sample::select(types), |property_type| {
            prop_assert_eq!(encode(property_type, &Value::Null).unwrap(), None);
            let empty = decode(&config(property_type), None);
            let expected = match property_type {
                PropertyType::MultiSelect
                | PropertyType::People
                | PropertyType::Relation
                | PropertyType::Files => json!([]),
                PropertyType::Checkbox => json!(false),
                _ => Value::Null,
            };
            prop_assert_eq!(empty, expected);
            Ok(())
        })
        .unwrap();
}
