use odf_model::{ModelError, ObjectId, SectionName};

#[test]
fn parses_singleton_indexed_and_nested_names() {
    let organ = SectionName::parse("Organ").expect("organ");
    assert_eq!(organ.type_name(), "Organ");
    assert!(organ.id().is_singleton());

    let stop = SectionName::parse("Stop012").expect("stop");
    assert_eq!(stop.type_name(), "Stop");
    assert_eq!(stop.id(), ObjectId::indexed(12));

    let plain = SectionName::parse("Switch7").expect("plain suffix");
    assert_eq!(plain.id(), ObjectId::indexed(7));
    assert_eq!(plain.canonical(), "Switch007");

    let element = SectionName::parse("Panel001Element002").expect("nested");
    assert_eq!(element.type_name(), "PanelElement");
    assert_eq!(element.id(), ObjectId::nested(1, 2));
    assert_eq!(element.canonical(), "Panel001Element002");
}

#[test]
fn rejects_names_that_cannot_be_objects() {
    for name in ["", "My Section", "001Stop", "Stop001Extra", "A1B2C3", "Stop_001"] {
        let err = SectionName::parse(name).expect_err(name);
        assert!(matches!(err, ModelError::InvalidSectionName { .. }), "{name}");
    }
}

#[test]
fn canonical_names_are_zero_padded() {
    assert_eq!(SectionName::new("Rank", ObjectId::indexed(3)).canonical(), "Rank003");
    assert_eq!(SectionName::nested("Panel", 0, "Element", 15).canonical(), "Panel000Element015");
    assert_eq!(SectionName::new("Organ", ObjectId::SINGLETON).to_string(), "Organ");
}
