use odf_ingest::split_lines;
use proptest::prelude::*;

proptest! {
    #[test]
    fn lines_and_terminators_rebuild_the_text(text in "[A-Za-z0-9=;\\[\\] \r\n]{0,200}") {
        let rebuilt: String = split_lines(&text)
            .iter()
            .map(|line| format!("{}{}", line.text, line.ending.as_str()))
            .collect();
        prop_assert_eq!(rebuilt, text);
    }
}
