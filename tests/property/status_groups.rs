//! Property-based tests for status-group expansion

use notion_typed::query::{translate_filter, WireFilter};
use notion_typed::schema::{PropertyOption, StatusGroup};
use notion_typed::{
    FilterNode, PropertyType, ResolvedDatabaseSchema, ResolvedPropertyConfig, SchemaRegistry,
    StatusGroupCondition,
};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::BTreeSet;

const GROUPS: usize = 4;

/// Registry with one status property whose option `i` belongs to group `assignment[i]`
fn registry(assignment: &[usize]) -> SchemaRegistry {
    let options = (0..assignment.len())
        .map(|i| PropertyOption {
            id: format!("o{}", i),
            name: format!("opt{}", i),
            color: None,
            description: None,
        })
        .collect();
    let groups = (0..GROUPS)
        .map(|g| StatusGroup {
            id: format!("g{}", g),
            name: format!("group{}", g),
            color: "default".to_string(),
            option_ids: assignment
                .iter()
                .enumerate()
                .filter(|&(_, &a)| a == g)
                .map(|(i, _)| format!("o{}", i))
                .collect(),
        })
        .collect();

    SchemaRegistry::new(vec![ResolvedDatabaseSchema {
        id: "db".to_string(),
        logical_name: "board".to_string(),
        label: "Board".to_string(),
        wire_name: "Board".to_string(),
        properties: vec![
            ResolvedPropertyConfig::new("st", "stage", "Stage", PropertyType::Status)
                .with_options(options)
                .with_groups(groups),
        ],
    }])
    .unwrap()
}

fn expand(registry: &SchemaRegistry, condition: StatusGroupCondition) -> WireFilter {
    translate_filter(registry, "board", &FilterNode::status_group("stage", condition))
}

fn options_in(assignment: &[usize], groups: &[usize]) -> BTreeSet<String> {
    assignment
        .iter()
        .enumerate()
        .filter(|&(_, a)| groups.contains(a))
        .map(|(i, _)| format!("opt{}", i))
        .collect()
}

/// Option names matched by a leaf `equals` or an `OR` of them
fn equals_options(filter: &Value) -> BTreeSet<String> {
    let leaves = match filter.get("or").and_then(Value::as_array) {
        Some(children) => children.clone(),
        None => vec![filter.clone()],
    };
    leaves
        .iter()
        .filter_map(|leaf| leaf["status"]["equals"].as_str().map(str::to_string))
        .collect()
}

fn assignment_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0..GROUPS, 1..8)
}

/// `equals g` matches exactly the options of g, with arity-dependent shape
#[test]
fn test_equals_matches_group_options() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(assignment_strategy(), 0..GROUPS), |(assignment, g)| {
            let registry = registry(&assignment);
            let expected = options_in(&assignment, &[g]);
            let filter = expand(&registry, StatusGroupCondition::Equals(format!("group{}", g)));

            match expected.len() {
                0 => prop_assert!(filter.is_unsatisfiable()),
                1 => {
                    let is_leaf = matches!(filter, WireFilter::Property { .. });
                    prop_assert!(is_leaf);
                    prop_assert_eq!(equals_options(&filter.to_json()), expected);
                }
                n => {
                    let arity = match &filter {
                        WireFilter::Or(children) => children.len(),
                        _ => 1,
                    };
                    prop_assert_eq!(arity, n);
                    prop_assert_eq!(equals_options(&filter.to_json()), expected);
                }
            }
            Ok(())
        })
        .unwrap();
}

/// `in_any` matches the union; `not_in_any` matches its complement
#[test]
fn test_in_any_and_not_in_any_partition_options() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(assignment_strategy(), prop::collection::vec(any::<bool>(), GROUPS)),
            |(assignment, mask)| {
                let registry = registry(&assignment);
                let chosen: Vec<usize> = (0..GROUPS).filter(|&g| mask[g]).collect();
                let names: Vec<String> = chosen.iter().map(|g| format!("group{}", g)).collect();

                let union = options_in(&assignment, &chosen);
                let complement: BTreeSet<String> = (0..assignment.len())
                    .map(|i| format!("opt{}", i))
                    .filter(|name| !union.contains(name))
                    .collect();

                let in_any = expand(&registry, StatusGroupCondition::InAny(names.clone()));
                if union.is_empty() {
                    prop_assert!(in_any.is_unsatisfiable());
                } else {
                    prop_assert_eq!(equals_options(&in_any.to_json()), union);
                }

                let not_in_any = expand(&registry, StatusGroupCondition::NotInAny(names));
                if complement.is_empty() {
                    prop_assert_eq!(
                        not_in_any.to_json(),
                        json!({ "property": "Stage", "status": { "is_empty": true } })
                    );
                } else {
                    prop_assert_eq!(equals_options(&not_in_any.to_json()), complement);
                }
                Ok(())
            },
        )
        .unwrap();
}

/// An unsatisfiable branch is dropped from an `OR`; a lone survivor replaces it
#[test]
fn test_unsatisfiable_branch_is_identity_in_or() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(assignment_strategy(), 0..GROUPS), |(assignment, g)| {
            let registry = registry(&assignment);
            let group = FilterNode::status_group(
                "stage",
                StatusGroupCondition::Equals(format!("group{}", g)),
            );
            let live = FilterNode::status_group("stage", StatusGroupCondition::IsNotEmpty);

            let filter = translate_filter(&registry, "board", &FilterNode::or(vec![group.clone(), live.clone()]));
            let group_only = translate_filter(&registry, "board", &group);
            let live_only = translate_filter(&registry, "board", &live);

            if group_only.is_unsatisfiable() {
                // The surviving branch replaces the OR
                prop_assert_eq!(filter, live_only);
            } else {
                prop_assert_eq!(filter, WireFilter::Or(vec![group_only, live_only]));
            }
            Ok(())
        })
        .unwrap();
}
