use odf_model::{ObjectId, PipeSample, Reference, TypedValue};
use odf_standards::{SchemaRegistry, classify};

fn typed(object_type: &str, key: &str, raw: &str) -> TypedValue {
    let registry = SchemaRegistry::bundled().expect("bundled registry");
    let schema = registry.schema_for(object_type).expect("schema");
    let matched = schema.resolve_key(key).expect("known key");
    classify(matched.def, raw, registry.odf())
}

#[test]
fn integers_and_reals() {
    assert_eq!(typed("Manual", "NumberOfLogicalKeys", " 61 "), TypedValue::Integer { value: 61 });
    assert_eq!(typed("Coupler", "DestinationKeyshift", "-12"), TypedValue::Integer { value: -12 });
    assert!(typed("Manual", "NumberOfLogicalKeys", "61.0").is_invalid());
    assert!(typed("Manual", "NumberOfLogicalKeys", "").is_invalid());

    assert_eq!(typed("Organ", "PitchTuning", "-3.5"), TypedValue::Real { value: -3.5 });
    assert_eq!(typed("Organ", "PitchTuning", "12"), TypedValue::Real { value: 12.0 });
    assert!(typed("Organ", "PitchTuning", "1e3").is_invalid());
    assert!(typed("Organ", "PitchTuning", "1.2.3").is_invalid());
}

#[test]
fn booleans_are_case_sensitive() {
    assert_eq!(typed("Organ", "HasPedals", "Y"), TypedValue::Boolean { value: true });
    assert_eq!(typed("Organ", "HasPedals", "N"), TypedValue::Boolean { value: false });
    assert!(typed("Organ", "HasPedals", "y").is_invalid());
    assert!(typed("Organ", "HasPedals", "yes").is_invalid());
}

#[test]
fn codes_resolve_labels() {
    assert_eq!(
        typed("Switch", "DefaultInputOutputSwitchAsgnCode", "1"),
        TypedValue::Code {
            label: Some("Blower".to_string())
        }
    );
    assert_eq!(
        typed("Switch", "DefaultInputOutputSwitchAsgnCode", "42"),
        TypedValue::Code { label: None }
    );
    assert_eq!(
        typed("Organ", "DispScreenSizeHoriz", "medium"),
        TypedValue::Code {
            label: Some("Medium (1007x663)".to_string())
        }
    );
    assert_eq!(
        typed("Organ", "DispScreenSizeHoriz", "1280"),
        TypedValue::Integer { value: 1280 }
    );
}

#[test]
fn colours_accept_names_and_hex() {
    assert!(matches!(
        typed("Switch", "DispLabelColour", "BLACK"),
        TypedValue::Code { label: Some(_) }
    ));
    assert_eq!(typed("Switch", "DispLabelColour", "#A0B0C0"), TypedValue::Text);
    assert!(typed("Switch", "DispLabelColour", "#12345").is_invalid());
}

#[test]
fn references_respect_signedness() {
    assert_eq!(
        typed("Manual", "Stop001", "004"),
        TypedValue::Reference(Reference {
            target: "Stop".to_string(),
            id: ObjectId::indexed(4),
            negated: false,
        })
    );
    assert!(typed("Manual", "Stop001", "-4").is_invalid());
    assert_eq!(
        typed("General", "SwitchNumber001", "-3"),
        TypedValue::Reference(Reference {
            target: "Switch".to_string(),
            id: ObjectId::indexed(3),
            negated: true,
        })
    );
}

#[test]
fn pipe_samples() {
    assert_eq!(typed("Rank", "Pipe001", "EMPTY"), TypedValue::Sample(PipeSample::Empty));
    assert_eq!(
        typed("Rank", "Pipe001", "REF:001:002:003"),
        TypedValue::Sample(PipeSample::Ref {
            manual: 1,
            stop: 2,
            pipe: 3,
        })
    );
    assert_eq!(
        typed("Rank", "Pipe001", r"Samples\Principal\036-C.WAV"),
        TypedValue::Sample(PipeSample::File)
    );
    assert!(typed("Rank", "Pipe001", "REF:1:2").is_invalid());
    assert!(typed("Rank", "Pipe001", "pipe.mp3").is_invalid());

    let sample = typed("Rank", "Pipe001", "REF:001:002:003");
    assert_eq!(sample.targets().len(), 2);
}
