use std::fs;

use odf_core::{Session, SessionError};
use odf_map::ConversionOptions;
use odf_model::{ModelError, ObjectHandle, RuleId};

const SWITCHES: &str = "[Switch001]\nName=Blower\nDefaultInputOutputSwitchAsgnCode=1\n";

fn session(text: &str) -> Session {
    Session::from_text(text).expect("bundled registry")
}

fn handle(session: &Session, section: &str) -> ObjectHandle {
    session.find(section).expect(section).handle()
}

fn labels(session: &Session) -> Vec<String> {
    session.document().objects().map(|object| object.label()).collect()
}

#[test]
fn edits_keep_the_written_key() {
    let mut session = session("[Rank001]\nName=Principal\nAmplitude=50\n");
    let rank = handle(&session, "Rank001");
    assert!(!session.is_modified());

    session.set_attribute(rank, "AmplitudeLevel", "60").expect("edit");
    insta::assert_debug_snapshot!(session.serialize(), @r#""[Rank001]\nName=Principal\nAmplitude=60\n""#);
    assert!(session.is_modified());

    let entry = session
        .attribute(rank, "AmplitudeLevel")
        .expect("known handle")
        .expect("attribute present");
    assert_eq!(entry.key(), "Amplitude");
    assert_eq!(entry.typed().as_real(), Some(60.0));
}

#[test]
fn added_attributes_land_in_declaration_order() {
    let mut session = session(SWITCHES);
    let switch = handle(&session, "Switch001");
    session.set_attribute(switch, "DefaultToEngaged", "Y").expect("edit");
    assert_eq!(
        session.serialize(),
        "[Switch001]\nName=Blower\nDefaultToEngaged=Y\nDefaultInputOutputSwitchAsgnCode=1\n"
    );
}

#[test]
fn findings_follow_the_current_state() {
    let mut session = session(
        "[Switch001]\nName=Blower\nDefaultInputOutputSwitchAsgnCode=1\nControllingSwitchID=99\n",
    );
    let switch = handle(&session, "Switch001");
    let before = session.validate();
    assert_eq!(
        before.iter().map(|d| d.rule).collect::<Vec<_>>(),
        vec![RuleId::DanglingReference]
    );

    let removed = session
        .remove_attribute(switch, "ControllingSwitchID")
        .expect("remove");
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].value(), "99");
    assert!(session.validate().is_empty());
}

#[test]
fn new_objects_get_required_defaults() {
    let mut session = session(SWITCHES);
    let group = session.add_object("WindchestGroup001").expect("add");
    assert_eq!(
        session.object_by_handle(group).expect("added").label(),
        "WindchestGroup001"
    );
    insta::assert_snapshot!(session.serialize(), @r"
    [Switch001]
    Name=Blower
    DefaultInputOutputSwitchAsgnCode=1

    [WindchestGroup001]
    NumberOfEnclosures=0
    NumberOfTremulants=0
    ");
}

#[test]
fn new_objects_are_placed_among_their_type() {
    let mut session = session("[Switch001]\nName=a\n[Switch003]\nName=c\n[Enclosure001]\nName=e\n");
    session.add_object("Switch002").expect("add");
    session.add_object("Switch000").expect_err("index 000");
    assert_eq!(
        labels(&session),
        vec!["Switch001", "Switch002", "Switch003", "Enclosure001"]
    );
}

#[test]
fn names_the_format_cannot_hold_are_refused() {
    let mut session = session(SWITCHES);
    assert!(matches!(
        session.add_object("Switch001"),
        Err(SessionError::DuplicateObject { name }) if name == "Switch001"
    ));
    assert!(matches!(
        session.add_object("Widget001"),
        Err(SessionError::InvalidSection { reason, .. }) if reason.contains("Widget")
    ));
    assert!(matches!(
        session.add_object("Switch"),
        Err(SessionError::InvalidSection { .. })
    ));
    assert!(!session.is_modified());
}

#[test]
fn edits_that_would_break_the_file_are_refused() {
    let mut session = session(SWITCHES);
    let switch = handle(&session, "Switch001");
    assert!(matches!(
        session.set_attribute(switch, "Name", "two\nlines"),
        Err(SessionError::MultilineValue { .. })
    ));
    assert!(matches!(
        session.set_attribute(switch, "Loudness", "3"),
        Err(SessionError::UnknownAttribute { name, .. }) if name == "Loudness"
    ));
    assert!(matches!(
        session.remove_attribute(switch, "ControllingSwitchID"),
        Err(SessionError::UnknownAttribute { .. })
    ));
    assert_eq!(session.serialize(), SWITCHES);
}

#[test]
fn referrers_and_removal() {
    let mut session = session(
        "[Switch001]\nName=a\nDefaultInputOutputSwitchAsgnCode=1\nControllingSwitchID=2\n\
         [Switch002]\nName=b\nDefaultInputOutputSwitchAsgnCode=1\n",
    );
    let first = handle(&session, "Switch001");
    let second = handle(&session, "Switch002");

    let referrers = session.referrers(second).expect("known handle");
    assert_eq!(referrers.len(), 1);
    assert_eq!(referrers[0].from, first);
    assert_eq!(referrers[0].attribute, "ControllingSwitchID");
    assert!(session.referrers(first).expect("known handle").is_empty());

    let removed = session.remove_object(second).expect("remove");
    assert_eq!(removed.label(), "Switch002");
    assert!(session.find("Switch002").is_none());
    assert_eq!(
        session.validate().with_rule(RuleId::DanglingReference).count(),
        1
    );
    assert!(matches!(
        session.referrers(second),
        Err(SessionError::UnknownObject { .. })
    ));
}

#[test]
fn moving_objects_reorders_the_output() {
    let mut session = session("[Switch001]\nName=a\n[Switch002]\nName=b\n");
    let second = handle(&session, "Switch002");
    session.move_object(second, 0).expect("move");
    assert_eq!(session.serialize(), "[Switch002]\nName=b\n[Switch001]\nName=a\n");

    assert!(matches!(
        session.move_object(second, 5),
        Err(SessionError::Model(ModelError::PositionOutOfRange { position: 5, len: 2 }))
    ));
}

#[test]
fn save_as_then_save() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("organ.organ");

    let mut session = Session::new_empty().expect("bundled registry");
    assert!(matches!(session.save(), Err(SessionError::NoPath)));
    session.add_object("WindchestGroup001").expect("add");
    session.save_as(&path).expect("save as");
    assert!(!session.is_modified());
    assert_eq!(session.path(), Some(path.as_path()));

    let bytes = fs::read(&path).expect("read back");
    assert_eq!(
        bytes,
        b"\xEF\xBB\xBF[WindchestGroup001]\r\nNumberOfEnclosures=0\r\nNumberOfTremulants=0\r\n"
    );

    let mut reopened = Session::open(&path).expect("open");
    let group = handle(&reopened, "WindchestGroup001");
    reopened.set_attribute(group, "Name", "Main").expect("edit");
    reopened.save().expect("save");
    let text = String::from_utf8(fs::read(&path).expect("read back")).expect("utf-8");
    assert!(text.starts_with("\u{feff}[WindchestGroup001]\r\nName=Main\r\n"), "{text:?}");
}

#[test]
fn missing_files_are_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = Session::open(dir.path().join("absent.organ"));
    assert!(matches!(result, Err(SessionError::Ingest(_))));
}

#[test]
fn converted_sample_sets_open_as_unsaved_sessions() {
    let fixture = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../odf-map/tests/fixtures/sample_set.xml"
    );
    let session = Session::convert(fixture, ConversionOptions::new()).expect("convert");
    assert!(session.path().is_none());
    assert!(session.is_modified());
    assert_eq!(session.conversion_diagnostics().len(), 5);
    assert!(session.find("Rank001").is_some());
    assert_eq!(session.objects_of_type("Manual").count(), 1);
    let report = session.validate();
    assert!(report.is_empty(), "{:?}", report.diagnostics);
}
