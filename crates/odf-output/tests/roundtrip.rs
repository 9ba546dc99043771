use odf_ingest::{parse_bytes, parse_str};
use odf_output::{serialize_to_bytes, serialize_to_string};
use odf_standards::{SchemaRegistry, SchemaSet};
use proptest::prelude::*;

fn odf() -> &'static SchemaSet {
    SchemaRegistry::bundled().expect("bundled registry").odf()
}

fn line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("[Organ]".to_string()),
        Just("[Stop001]".to_string()),
        Just("[Panel000Element002]".to_string()),
        Just("[Mystery7]".to_string()),
        Just("[Switch00x".to_string()),
        "(Name|Pipe001|Amplitude|Bogus|NumberOfRanks) ?= ?[A-Za-z0-9 .\\\\]{0,12}",
        ";[ -~]{0,20}",
        "[ \t]{0,3}",
        "[A-Za-z0-9=;\\[\\] ]{0,20}",
    ]
}

fn ending() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("\n"), Just("\r\n"), Just("\r")]
}

proptest! {
    #[test]
    fn untouched_text_is_written_back_exactly(
        lines in prop::collection::vec((line(), ending()), 0..40),
        last in prop::option::of(line()),
    ) {
        let mut text: String = lines
            .iter()
            .map(|(line, ending)| format!("{line}{ending}"))
            .collect();
        if let Some(last) = last {
            text.push_str(&last);
        }
        let outcome = parse_str(&text, odf());
        prop_assert_eq!(serialize_to_string(&outcome.document), text);
    }

    #[test]
    fn untouched_bytes_are_written_back_exactly(
        bom in any::<bool>(),
        body in prop::collection::vec(
            prop::sample::select(b"[]=;Name1\r\n \xE9\xC3\xA9\xEF\xBB\xBF".to_vec()),
            0..120,
        ),
    ) {
        let mut bytes = if bom { b"\xEF\xBB\xBF".to_vec() } else { Vec::new() };
        bytes.extend(body);
        let outcome = parse_bytes(&bytes, odf());
        prop_assert_eq!(serialize_to_bytes(&outcome.document).expect("encodable"), bytes);
    }
}
