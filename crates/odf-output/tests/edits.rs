use std::fs;

use odf_ingest::{make_entry, parse_bytes, parse_str, read_file};
use odf_model::{Document, ObjectId, OrganObject, SectionName, TextEncoding, TypedValue};
use odf_output::{OutputError, serialize_to_bytes, serialize_to_string, write_file};
use odf_standards::{SchemaRegistry, SchemaSet};

fn odf() -> &'static SchemaSet {
    SchemaRegistry::bundled().expect("bundled registry").odf()
}

fn edit_value(document: &mut Document, type_name: &str, index: u32, name: &str, value: &str) {
    let handle = document
        .resolve(type_name, ObjectId::indexed(index))
        .expect("object")
        .handle();
    let object = document.object_mut(handle).expect("object");
    assert!(object.set_value(name, value, TypedValue::Text));
}

fn add_switch(document: &mut Document, index: u32, name: &str) {
    let schema = odf().schema_for("Switch").expect("Switch schema");
    let mut object = OrganObject::new(SectionName::new("Switch", ObjectId::indexed(index)));
    object.insert_attribute(None, make_entry(schema, odf(), "Name", name));
    document.push_object(object);
}

#[test]
fn edited_value_keeps_key_spelling_and_terminator() {
    let mut document = parse_str("[Rank001]\r\nName=Principal\r\nAmplitude=50\r\n", odf()).document;
    edit_value(&mut document, "Rank", 1, "AmplitudeLevel", "60");
    insta::assert_debug_snapshot!(serialize_to_string(&document), @r#""[Rank001]\r\nName=Principal\r\nAmplitude=60\r\n""#);
}

#[test]
fn new_sections_are_set_apart_by_a_blank_line() {
    let mut document = parse_str("; generated\n[Switch001]\nName=Blower", odf()).document;
    add_switch(&mut document, 2, "Tracker");
    assert_eq!(
        serialize_to_string(&document),
        "; generated\n[Switch001]\nName=Blower\n\n[Switch002]\nName=Tracker\n"
    );

    let mut spaced = parse_str("[Switch001]\nName=Blower\n\n", odf()).document;
    add_switch(&mut spaced, 2, "Tracker");
    assert_eq!(
        serialize_to_string(&spaced),
        "[Switch001]\nName=Blower\n\n[Switch002]\nName=Tracker\n"
    );
}

#[test]
fn unclassified_sections_keep_their_place() {
    let text = "[Switch001]\nName=a\n[Sequencer001]\nSteps=8\n[Switch002]\nName=b\n";
    let mut document = parse_str(text, odf()).document;
    edit_value(&mut document, "Switch", 2, "Name", "c");
    assert_eq!(
        serialize_to_string(&document),
        "[Switch001]\nName=a\n[Sequencer001]\nSteps=8\n[Switch002]\nName=c\n"
    );
}

#[test]
fn latin1_documents_reject_characters_they_cannot_hold() {
    let mut document = parse_bytes(b"[Switch001]\nName=Pr\xE9stant\n", odf()).document;
    assert_eq!(document.encoding(), TextEncoding::Latin1);
    assert_eq!(
        serialize_to_bytes(&document).expect("latin1"),
        b"[Switch001]\nName=Pr\xE9stant\n"
    );

    edit_value(&mut document, "Switch", 1, "Name", "\u{20ac}");
    let error = serialize_to_bytes(&document).expect_err("euro sign");
    assert!(matches!(error, OutputError::Unrepresentable { line: 2, .. }));
}

#[test]
fn written_file_reads_back_identically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = b"\xEF\xBB\xBF[Switch001]\r\nName=Blower\r\n";
    let mut document = parse_bytes(source, odf()).document;
    edit_value(&mut document, "Switch", 1, "Name", "Wind");

    let path = dir.path().join("organ.organ");
    write_file(&document, &path).expect("write");
    assert_eq!(
        fs::read(&path).expect("read"),
        b"\xEF\xBB\xBF[Switch001]\r\nName=Wind\r\n"
    );

    let reread = read_file(&path, odf()).expect("reread").document;
    assert_eq!(reread.encoding(), TextEncoding::Utf8 { bom: true });
    assert_eq!(
        reread.resolve("Switch", ObjectId::indexed(1)).and_then(|s| s.value("Name")),
        Some("Wind")
    );
}

#[test]
fn unwritable_path_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let document = parse_str("[Switch001]\nName=x\n", odf()).document;
    let error = write_file(&document, &dir.path().join("missing").join("organ.organ"))
        .expect_err("missing directory");
    assert!(matches!(error, OutputError::Io { .. }));
}
