use std::fs;

use odf_ingest::{IngestError, read_file};
use odf_model::TextEncoding;
use odf_standards::SchemaRegistry;

#[test]
fn reads_bom_file_from_disk() {
    let registry = SchemaRegistry::bundled().expect("bundled registry");
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("demo.organ");
    fs::write(&path, b"\xEF\xBB\xBF[Organ]\nChurchName=St. Mary\n").expect("write");

    let outcome = read_file(&path, registry.odf()).expect("read odf");
    assert_eq!(outcome.document.encoding(), TextEncoding::Utf8 { bom: true });
    assert_eq!(outcome.document.object_count(), 1);
}

#[test]
fn missing_file_is_an_io_error() {
    let registry = SchemaRegistry::bundled().expect("bundled registry");
    let dir = tempfile::tempdir().expect("tempdir");
    let err = read_file(&dir.path().join("absent.organ"), registry.odf()).unwrap_err();
    assert!(matches!(err, IngestError::Io { .. }));
}
