use std::collections::BTreeMap;
use std::path::Path;

use odf_model::{AttributeEntry, BodyLine, Document, ObjectId, OrganObject, SectionName, TypedValue};
use odf_standards::{Condition, EnumTable, PanelFormat, PredicateContext, load_schema_set};

fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn holds(condition: &Condition, attributes: &BTreeMap<String, String>, format: PanelFormat) -> bool {
    let predicate = condition.compile();
    predicate(&PredicateContext::new(attributes, format))
}

#[test]
fn equals_is_case_insensitive_and_false_when_absent() {
    let condition = Condition::Equals {
        attribute: "UnisonOff".to_string(),
        equals: "N".to_string(),
    };
    assert!(holds(&condition, &attrs(&[("UnisonOff", "n")]), PanelFormat::Old));
    assert!(!holds(&condition, &attrs(&[("UnisonOff", "Y")]), PanelFormat::Old));
    assert!(!holds(&condition, &attrs(&[]), PanelFormat::Old));
}

#[test]
fn membership_conditions() {
    let one_of = Condition::OneOf {
        attribute: "Type".to_string(),
        values: vec!["Stop".to_string(), "Coupler".to_string()],
    };
    let not_in = Condition::NotIn {
        attribute: "Function".to_string(),
        not_in: vec!["Input".to_string()],
    };
    let absent_or = Condition::AbsentOr {
        attribute: "NumberOfRanks".to_string(),
        absent_or: vec!["0".to_string()],
    };

    assert!(holds(&one_of, &attrs(&[("Type", "STOP")]), PanelFormat::New));
    assert!(!holds(&one_of, &attrs(&[]), PanelFormat::New));

    assert!(holds(&not_in, &attrs(&[("Function", "And")]), PanelFormat::New));
    assert!(!holds(&not_in, &attrs(&[("Function", "input")]), PanelFormat::New));

    assert!(holds(&absent_or, &attrs(&[]), PanelFormat::New));
    assert!(holds(&absent_or, &attrs(&[("NumberOfRanks", "0")]), PanelFormat::New));
    assert!(!holds(&absent_or, &attrs(&[("NumberOfRanks", "2")]), PanelFormat::New));
}

#[test]
fn combinators_and_panel_format() {
    let condition = Condition::All {
        all: vec![
            Condition::Panel {
                panel_format: PanelFormat::Old,
            },
            Condition::Any {
                any: vec![
                    Condition::Equals {
                        attribute: "A".to_string(),
                        equals: "1".to_string(),
                    },
                    Condition::Equals {
                        attribute: "B".to_string(),
                        equals: "1".to_string(),
                    },
                ],
            },
        ],
    };
    assert!(holds(&condition, &attrs(&[("B", "1")]), PanelFormat::Old));
    assert!(!holds(&condition, &attrs(&[("B", "1")]), PanelFormat::New));
    assert!(!holds(&condition, &attrs(&[]), PanelFormat::Old));
    insta::assert_snapshot!(condition.to_string(), @"panel format is old and A=1 or B=1");
}

#[test]
fn conditions_deserialize_from_schema_syntax() {
    let condition: Condition =
        toml::from_str(r#"attribute = "Function"
not_in = ["Input"]"#)
            .expect("parse condition");
    assert_eq!(
        condition,
        Condition::NotIn {
            attribute: "Function".to_string(),
            not_in: vec!["Input".to_string()],
        }
    );
}

#[test]
fn panel_format_detection() {
    let mut document = Document::default();
    assert_eq!(PanelFormat::detect(&document), PanelFormat::Old);

    let name = SectionName::parse("Panel000").expect("section name");
    let mut panel = OrganObject::new(name);
    panel.push_line(BodyLine::Attribute(AttributeEntry::new(
        "NumberOfGUIElements",
        "0",
        Some("NumberOfGUIElements".to_string()),
        TypedValue::Integer { value: 0 },
    )));
    document.push_object(panel);
    assert!(document.resolve("Panel", ObjectId::indexed(0)).is_some());
    assert_eq!(PanelFormat::detect(&document), PanelFormat::New);
}

#[test]
fn enum_patterns_need_a_prefix() {
    let mut table = EnumTable::new("ElementType");
    table.push("Generalxx", "Setter general button");
    table.push("Lx", "Combination memory level");
    table.push("Next", "Next combination");
    table.push("Prev", "Previous combination");

    assert!(table.codes()[0].is_pattern());
    assert!(table.codes()[1].is_pattern());
    assert!(!table.codes()[2].is_pattern());

    assert_eq!(table.label("General07"), Some("Setter general button"));
    assert_eq!(table.label("GeneralAB"), None);
    assert_eq!(table.label("L3"), Some("Combination memory level"));
    assert_eq!(table.label("Next"), Some("Next combination"));
    assert_eq!(table.label("NEXT"), Some("Next combination"));
}

#[test]
fn custom_sets_load_from_strings() {
    let objects = r#"
schema = "custom"

[types.Widget]
shape = "indexed"
id_attribute = "WidgetID"
attributes = [
    { name = "WidgetID", kind = "integer", required = true },
    { name = "Mode", kind = "code", table = "Mode", required_if = { attribute = "WidgetID", equals = "1" } },
]
"#;
    let enums = "table,code,label\nMode,A,Automatic\n";
    let set = load_schema_set(
        Path::new("objects.toml"),
        objects,
        Path::new("enums.csv"),
        enums,
        None,
    )
    .expect("load custom set");
    let widget = set.schema_for("Widget").expect("Widget");
    assert_eq!(widget.id_attribute.as_deref(), Some("WidgetID"));
    assert_eq!(set.enum_table("Mode").map(|t| t.len()), Some(1));
}

#[test]
fn dangling_schema_links_are_rejected() {
    let objects = r#"
schema = "custom"

[types.Widget]
shape = "indexed"
attributes = [{ name = "Owner", kind = "reference", target = "Gadget" }]
"#;
    let err = load_schema_set(
        Path::new("objects.toml"),
        objects,
        Path::new("enums.csv"),
        "table,code,label\n",
        None,
    )
    .unwrap_err();
    assert!(err.to_string().contains("Gadget"), "{err}");
}
