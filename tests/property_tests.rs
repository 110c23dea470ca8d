//! Property-based tests for the round-trip and conversion guarantees.
//!
//! Generated trees only use values whose text form reads back as the same
//! kind (alphanumeric text, 32-bit integers, booleans, empty). The coercion
//! properties cover every kind, including non-finite floats and extreme
//! decimals.

use chrono::{NaiveDate, NaiveDateTime};
use doctree::xml::entity;
use doctree::{parse_json, parse_xml, JsonDocument, NodeId, Value, XmlDocument};
use proptest::prelude::*;
use rust_decimal::Decimal;

#[derive(Clone, Debug)]
struct Tree {
    name: String,
    value: Value,
    attrs: Vec<(String, Value)>,
    children: Vec<Tree>,
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}"
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Empty),
        "[A-Za-z][A-Za-z0-9]{0,8}".prop_map(Value::Text),
        any::<i32>().prop_map(Value::Int32),
        any::<bool>().prop_map(Value::Bool),
    ]
}

fn timestamp_strategy() -> impl Strategy<Value = NaiveDateTime> {
    (1i32..=9999, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60, 0u32..60).prop_map(
        |(y, m, d, h, min, s)| {
            NaiveDate::from_ymd_opt(y, m, d)
                .and_then(|date| date.and_hms_opt(h, min, s))
                .unwrap()
        },
    )
}

fn decimal_strategy() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        (any::<i64>(), 0u32..=28).prop_map(|(n, scale)| Decimal::new(n, scale)),
        Just(Decimal::MAX),
        Just(Decimal::MIN),
    ]
}

/// Every kind, including non-finite floats and extreme magnitudes.
fn any_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Empty),
        "\\PC{0,16}".prop_map(Value::Text),
        any::<i32>().prop_map(Value::Int32),
        any::<i64>().prop_map(Value::Int64),
        any::<bool>().prop_map(Value::Bool),
        prop_oneof![
            any::<f64>(),
            Just(f64::NAN),
            Just(f64::INFINITY),
            Just(f64::NEG_INFINITY),
            Just(f64::MAX),
            Just(f64::MIN),
        ]
        .prop_map(Value::Float64),
        decimal_strategy().prop_map(Value::Decimal),
        timestamp_strategy().prop_map(Value::Timestamp),
    ]
}

fn tree_strategy() -> impl Strategy<Value = Tree> {
    let leaf = (
        name_strategy(),
        value_strategy(),
        prop::collection::vec((name_strategy(), value_strategy()), 0..3),
    )
        .prop_map(|(name, value, attrs)| Tree {
            name,
            value,
            attrs,
            children: Vec::new(),
        });
    leaf.prop_recursive(3, 24, 4, |inner| {
        (
            name_strategy(),
            prop::collection::vec((name_strategy(), value_strategy()), 0..3),
            prop::collection::vec(inner, 1..4),
        )
            .prop_map(|(name, attrs, children)| Tree {
                name,
                value: Value::Empty,
                attrs,
                children,
            })
    })
}

fn build_xml(doc: &mut XmlDocument, id: NodeId, tree: &Tree) {
    doc.set_name(id, &tree.name);
    doc.set_value(id, tree.value.clone());
    for (name, value) in &tree.attrs {
        doc.set_attr(id, name, value.clone()).unwrap();
    }
    for child in &tree.children {
        let child_id = doc.append(id, "");
        build_xml(doc, child_id, child);
    }
}

fn build_json(doc: &mut JsonDocument, id: NodeId, tree: &Tree, named: bool) {
    if named {
        doc.set_name(id, &tree.name);
    }
    doc.set_value(id, tree.value.clone());
    let named_children = tree.children.len() % 2 == 0;
    for child in &tree.children {
        let child_id = doc.append(id, "");
        build_json(doc, child_id, child, named_children);
    }
}

proptest! {
    #[test]
    fn prop_xml_compact_round_trip(tree in tree_strategy()) {
        let mut doc = XmlDocument::new("");
        let root = doc.root();
        build_xml(&mut doc, root, &tree);
        let once = doc.to_string_compact();
        let reparsed = parse_xml(&once).unwrap();
        prop_assert_eq!(reparsed.to_string_compact(), once);
    }

    #[test]
    fn prop_json_compact_round_trip(tree in tree_strategy()) {
        let mut doc = JsonDocument::new();
        let root = doc.root();
        build_json(&mut doc, root, &tree, false);
        let once = doc.to_json_string(true);
        prop_assert_eq!(parse_json(&once).to_json_string(true), once);
    }

    #[test]
    fn prop_entity_bijection(text in "\\PC{0,40}") {
        let encoded = entity::encode(&text);
        prop_assert!(!encoded.contains(['<', '>', '"', '\'']));
        prop_assert_eq!(entity::decode(&encoded), text.as_str());
    }

    #[test]
    fn prop_int32_text_closure(n in any::<i32>()) {
        let text = Value::Int32(n).text().unwrap();
        prop_assert_eq!(Value::Text(text).int32(), Some(n));
    }

    #[test]
    fn prop_int64_text_closure(n in any::<i64>()) {
        let text = Value::Int64(n).text().unwrap();
        prop_assert_eq!(Value::Text(text).int64(), Some(n));
    }

    #[test]
    fn prop_bool_text_closure(b in any::<bool>()) {
        let text = Value::Bool(b).text().unwrap();
        prop_assert_eq!(Value::Text(text).boolean(), Some(b));
    }

    #[test]
    fn prop_float_text_closure(f in any::<f64>().prop_filter("finite", |f| f.is_finite())) {
        let text = Value::Float64(f).text().unwrap();
        prop_assert_eq!(Value::Text(text).float64(), Some(f));
    }

    #[test]
    fn prop_getters_never_fail(value in any_value_strategy()) {
        let present = !value.is_empty();
        prop_assert_eq!(value.int32().is_some(), present);
        prop_assert_eq!(value.int64().is_some(), present);
        prop_assert_eq!(value.boolean().is_some(), present);
        prop_assert_eq!(value.float64().is_some(), present);
        prop_assert_eq!(value.decimal().is_some(), present);
        prop_assert_eq!(value.timestamp().is_some(), present);
        prop_assert_eq!(value.text().is_some(), present);
    }

    #[test]
    fn prop_same_kind_read_back(value in any_value_strategy()) {
        match &value {
            Value::Empty => prop_assert!(value.text().is_none()),
            Value::Text(s) => prop_assert_eq!(value.text(), Some(s.clone())),
            Value::Int32(n) => prop_assert_eq!(value.int32(), Some(*n)),
            Value::Int64(n) => prop_assert_eq!(value.int64(), Some(*n)),
            Value::Bool(b) => prop_assert_eq!(value.boolean(), Some(*b)),
            Value::Float64(f) if f.is_nan() => {
                prop_assert!(value.float64().map_or(false, f64::is_nan));
            }
            Value::Float64(f) => prop_assert_eq!(value.float64(), Some(*f)),
            Value::Decimal(d) => prop_assert_eq!(value.decimal(), Some(*d)),
            Value::Timestamp(ts) => prop_assert_eq!(value.timestamp(), Some(*ts)),
        }
    }

    #[test]
    fn prop_timestamp_text_closure(ts in timestamp_strategy()) {
        let text = Value::Timestamp(ts).text().unwrap();
        prop_assert_eq!(Value::Text(text).timestamp(), Some(ts));
    }

    #[test]
    fn prop_decimal_text_keeps_four_digits(n in any::<i64>(), scale in 0u32..=10) {
        let text = Value::Decimal(Decimal::new(n, scale)).text().unwrap();
        let fraction = text.split_once('.').map(|(_, f)| f.len());
        prop_assert_eq!(fraction, Some(4));
    }
}
