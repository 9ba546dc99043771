use odf_model::{
    AttributeEntry, BodyLine, Document, ModelError, ObjectId, OrganObject, Reference,
    SectionName, TypedValue,
};

fn switch(index: u32) -> OrganObject {
    let mut object = OrganObject::new(SectionName::new("Switch", ObjectId::indexed(index)));
    object.push_line(BodyLine::Attribute(AttributeEntry::new(
        "Name",
        format!("Switch {index}"),
        Some("Name".to_string()),
        TypedValue::Text,
    )));
    object
}

fn reference_to_switch(index: u32) -> TypedValue {
    TypedValue::Reference(Reference {
        target: "Switch".to_string(),
        id: ObjectId::indexed(index),
        negated: false,
    })
}

#[test]
fn resolve_finds_objects_by_type_and_id() {
    let mut document = Document::default();
    let first = document.push_object(switch(1));
    document.push_object(switch(2));

    let found = document
        .resolve("Switch", ObjectId::indexed(1))
        .expect("switch 1");
    assert_eq!(found.handle(), first);
    assert!(document.resolve("Switch", ObjectId::indexed(3)).is_none());
    assert!(document.resolve("Stop", ObjectId::indexed(1)).is_none());
}

#[test]
fn structural_edits_rebuild_the_index() {
    let mut document = Document::default();
    let handle = document.push_object(switch(1));
    assert!(document.resolve("Switch", ObjectId::indexed(1)).is_some());

    document.remove_object(handle).expect("remove");
    assert!(document.resolve("Switch", ObjectId::indexed(1)).is_none());

    let inserted = document.insert_object(0, switch(4));
    assert_eq!(
        document
            .resolve("Switch", ObjectId::indexed(4))
            .map(OrganObject::handle),
        Some(inserted)
    );
}

#[test]
fn referrers_follow_attribute_edits() {
    let mut document = Document::default();
    document.push_object(switch(1));
    let mut stop = OrganObject::new(SectionName::new("Stop", ObjectId::indexed(1)));
    stop.push_line(BodyLine::Attribute(AttributeEntry::new(
        "ControllingSwitchID",
        "1",
        Some("ControllingSwitchID".to_string()),
        reference_to_switch(1),
    )));
    let stop = document.push_object(stop);

    let sites = document.referrers("Switch", ObjectId::indexed(1));
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].from, stop);
    assert_eq!(sites[0].attribute, "ControllingSwitchID");

    document
        .object_mut(stop)
        .expect("stop")
        .set_value("ControllingSwitchID", "2", reference_to_switch(2));
    assert!(document.referrers("Switch", ObjectId::indexed(1)).is_empty());
    assert_eq!(document.referrers("Switch", ObjectId::indexed(2)).len(), 1);
}

#[test]
fn duplicate_identifiers_are_collisions() {
    let mut document = Document::default();
    document.push_object(switch(1));
    document.push_object(switch(1));
    let collisions = document.index().collisions();
    assert_eq!(collisions.len(), 1);
    assert_eq!(collisions[0].first, 0);
    assert_eq!(collisions[0].duplicate, 1);
}

#[test]
fn move_object_reorders_sections() {
    let mut document = Document::default();
    let a = document.push_object(switch(1));
    let b = document.push_object(switch(2));
    document.move_object(b, 0).expect("move");
    assert_eq!(document.position_of(b), Some(0));
    assert_eq!(document.position_of(a), Some(1));

    let err = document.move_object(a, 5).expect_err("out of range");
    assert_eq!(err, ModelError::PositionOutOfRange { position: 5, len: 2 });
}

#[test]
fn insert_attribute_respects_anchor() {
    let mut object = switch(1);
    object.push_line(BodyLine::Blank(odf_model::TextLine::new(
        "",
        odf_model::LineEnding::Lf,
    )));
    object.insert_attribute(
        None,
        AttributeEntry::new("Displayed", "N", Some("Displayed".to_string()), TypedValue::Boolean { value: false }),
    );
    object.insert_attribute(
        Some("Displayed"),
        AttributeEntry::new("ShortcutKey", "12", Some("ShortcutKey".to_string()), TypedValue::Integer { value: 12 }),
    );
    let names: Vec<&str> = object.attributes().map(AttributeEntry::name).collect();
    assert_eq!(names, ["Name", "ShortcutKey", "Displayed"]);
    assert!(object.body().last().is_some_and(BodyLine::is_blank));
}

fn of_type<'d>(document: &'d Document, type_name: &str) -> Vec<&'d OrganObject> {
    document.objects_of_type(type_name).collect()
}

#[test]
fn objects_of_type_outlive_the_type_name() {
    let mut document = Document::default();
    document.push_object(switch(1));
    document.push_object(switch(2));

    let switches = {
        let name = String::from("Switch");
        of_type(&document, &name)
    };
    let labels: Vec<String> = switches.iter().map(|object| object.label()).collect();
    assert_eq!(labels, vec!["Switch001", "Switch002"]);
}
