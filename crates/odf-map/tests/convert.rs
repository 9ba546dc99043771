use std::fs;

use chrono::{TimeZone, Utc};
use odf_ingest::parse_str;
use odf_map::{ConversionOptions, ConvertError, Converter, convert_file};
use odf_model::{BodyLine, Document, ObjectId, RuleId, TextEncoding};
use odf_output::{UTF8_BOM, serialize_to_bytes, serialize_to_string};
use odf_standards::SchemaRegistry;
use odf_validate::{ValidationOptions, validate};

const SAMPLE_SET: &str = include_str!("fixtures/sample_set.xml");

fn registry() -> &'static SchemaRegistry {
    SchemaRegistry::bundled().expect("bundled registry")
}

fn options() -> ConversionOptions {
    ConversionOptions::new()
        .with_timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap())
        .with_source_name("sample_set.xml")
}

fn section(document: &Document, type_name: &str, id: ObjectId) -> String {
    let object = document
        .resolve(type_name, id)
        .unwrap_or_else(|| panic!("{type_name} {id:?} missing"));
    object
        .attributes()
        .map(|entry| format!("{}={}", entry.key(), entry.value()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn rank_pipes_map_samples_and_tuning() {
    let conversion = Converter::new(registry())
        .with_options(options())
        .convert_str(SAMPLE_SET)
        .unwrap();
    insta::assert_snapshot!(section(&conversion.document, "Rank", ObjectId::indexed(1)), @r"
    Name=Principal 8
    FirstMidiNoteNumber=36
    WindchestGroup=1
    Percussive=N
    AmplitudeLevel=90
    NumberOfLogicalPipes=4
    Pipe001=OrganInstallationPackages\000001\Principal\036-c.wav
    Pipe001Gain=-1.5
    Pipe002=OrganInstallationPackages\000001\Principal\037-c.wav
    Pipe002PitchTuning=7.4
    Pipe002LoadRelease=N
    Pipe002AttackCount=1
    Pipe002Attack001=OrganInstallationPackages\000001\Principal\037-c-2.wav
    Pipe002ReleaseCount=1
    Pipe002Release001=OrganInstallationPackages\000001\Principal\rel\037-c.wav
    Pipe003=EMPTY
    Pipe004=OrganInstallationPackages\000001\Principal\039-d#.wav
    Pipe004WindchestGroup=2
    ");
}

#[test]
fn stops_manuals_and_combinations_are_linked() {
    let conversion = Converter::new(registry())
        .with_options(options())
        .convert_str(SAMPLE_SET)
        .unwrap();
    let document = &conversion.document;

    insta::assert_snapshot!(section(document, "Stop", ObjectId::indexed(1)), @r"
    Name=Principal
    Function=And
    SwitchCount=1
    Switch001=1
    NumberOfRanks=1
    FirstAccessiblePipeLogicalKeyNumber=1
    NumberOfAccessiblePipes=5
    Rank001=1
    Rank001FirstPipeNumber=1
    Rank001PipeCount=4
    Rank001FirstAccessibleKeyNumber=1
    ");
    insta::assert_snapshot!(section(document, "Manual", ObjectId::indexed(1)), @r"
    Name=Great
    NumberOfLogicalKeys=5
    FirstAccessibleKeyLogicalKeyNumber=1
    FirstAccessibleKeyMIDINoteNumber=36
    NumberOfAccessibleKeys=5
    NumberOfStops=1
    Stop001=1
    NumberOfDivisionals=1
    Divisional001=1
    NumberOfSwitches=2
    Switch001=2
    Switch002=4
    ");
    insta::assert_snapshot!(section(document, "General", ObjectId::indexed(1)), @r"
    Name=Full
    NumberOfCouplers=0
    NumberOfStops=1
    StopNumber001=1
    StopManual001=1
    NumberOfTremulants=1
    TremulantNumber001=-1
    NumberOfSwitches=1
    SwitchNumber001=4
    ");
    insta::assert_snapshot!(section(document, "Divisional", ObjectId::indexed(1)), @r"
    Name=Great 1
    NumberOfCouplers=0
    NumberOfStops=1
    Stop001=1
    NumberOfTremulants=0
    ");
}

#[test]
fn wind_and_tremulants() {
    let conversion = Converter::new(registry())
        .with_options(options())
        .convert_str(SAMPLE_SET)
        .unwrap();
    let document = &conversion.document;

    insta::assert_snapshot!(section(document, "WindchestGroup", ObjectId::indexed(1)), @r"
    Name=Great chest
    NumberOfEnclosures=1
    Enclosure001=1
    NumberOfTremulants=1
    Tremulant001=1
    ");
    insta::assert_snapshot!(section(document, "WindchestGroup", ObjectId::indexed(2)), @r"
    Name=Pedal chest
    NumberOfEnclosures=0
    NumberOfTremulants=0
    ");
    insta::assert_snapshot!(section(document, "Tremulant", ObjectId::indexed(1)), @r"
    Name=Tremulant
    TremulantType=Synth
    Period=210
    StartRate=8
    StopRate=8
    AmpModDepth=18
    Function=And
    SwitchCount=1
    Switch001=3
    ");
    assert_eq!(
        section(document, "Enclosure", ObjectId::indexed(1)),
        "Name=Swell box\nAmpMinimumLevel=13"
    );
    assert_eq!(
        section(document, "Switch", ObjectId::indexed(4)),
        "Name=Blower\nDefaultToEngaged=Y"
    );
}

#[test]
fn organ_header_counts_generated_objects() {
    let conversion = Converter::new(registry())
        .with_options(options())
        .convert_str(SAMPLE_SET)
        .unwrap();
    let organ = conversion
        .document
        .resolve("Organ", ObjectId::SINGLETON)
        .expect("Organ");
    assert_eq!(organ.value("ChurchName"), Some("St. Test & All Saints"));
    assert_eq!(organ.value("ChurchAddress"), Some("Testville"));
    assert_eq!(organ.value("OrganBuilder"), Some("Example & Sons"));
    assert_eq!(organ.value("NumberOfManuals"), Some("1"));
    assert_eq!(organ.value("NumberOfWindchestGroups"), Some("2"));
    assert_eq!(organ.value("NumberOfSwitches"), Some("4"));
    assert_eq!(organ.value("NumberOfRanks"), Some("1"));
    assert_eq!(organ.value("NumberOfGenerals"), Some("1"));
    assert_eq!(organ.value("DivisionalsStoreTremulants"), Some("Y"));

    let panel = conversion
        .document
        .resolve("Panel", ObjectId::indexed(0))
        .expect("Panel000");
    assert_eq!(panel.value("NumberOfGUIElements"), Some("0"));
    assert_eq!(panel.value("DispScreenSizeHoriz"), Some("MEDIUM"));

    let renamed = Converter::new(registry())
        .with_options(options().with_organ_name("Demo"))
        .convert_str(SAMPLE_SET)
        .unwrap();
    let organ = renamed
        .document
        .resolve("Organ", ObjectId::SINGLETON)
        .expect("Organ");
    assert_eq!(organ.value("ChurchName"), Some("Demo"));
}

#[test]
fn skipped_objects_are_reported_in_order() {
    let conversion = Converter::new(registry())
        .with_options(options())
        .convert_str(SAMPLE_SET)
        .unwrap();
    assert!(conversion.diagnostics.iter().all(|d| d.rule == RuleId::ConversionSkipped));
    let rendered: Vec<String> = conversion.diagnostics.iter().map(ToString::to_string).collect();
    insta::assert_snapshot!(rendered.join("\n"), @r"
    warning[ConversionSkipped] Rank #2: RankID is missing
    warning[ConversionSkipped] Pipe 2004: pitch offset of -2400 cents is more than an octave
    warning[ConversionSkipped] Pipe 2005: sample 5999 is missing
    warning[ConversionSkipped] Stop 101: division 2 is not played from any keyboard
    warning[ConversionSkipped] Combination 602: combination type 3 is not converted
    ");

    assert_eq!(conversion.ids.get("Stop", 100), Some(1));
    assert_eq!(conversion.ids.get("Stop", 101), None);
    assert_eq!(conversion.ids.get("Switch", 43), Some(4));
    assert_eq!(conversion.ids.get("WindchestGroup", 11), Some(2));
}

#[test]
fn output_is_crlf_utf8_with_bom_and_validates_cleanly() {
    let conversion = Converter::new(registry())
        .with_options(options())
        .convert_str(SAMPLE_SET)
        .unwrap();
    assert_eq!(conversion.document.encoding(), TextEncoding::Utf8 { bom: true });

    let bytes = serialize_to_bytes(&conversion.document).unwrap();
    assert!(bytes.starts_with(UTF8_BOM));
    let text = serialize_to_string(&conversion.document);
    assert!(text.starts_with(
        "; GrandOrgue organ definition converted from a Hauptwerk sample set\r\n\
         ; Source: sample_set.xml\r\n"
    ));
    assert!(text.contains(" on 2024-03-01 12:30:00 UTC\r\n\r\n[Organ]\r\n"));
    assert!(text.contains("\r\n\r\n[Rank001]\r\n"));
    assert!(!text.contains("\r\n\r\n\r\n"));

    let odf = registry().odf();
    let reparsed = parse_str(&text, odf);
    assert!(reparsed.diagnostics.is_empty(), "{:?}", reparsed.diagnostics);
    let report = validate(&reparsed.document, odf, &ValidationOptions::default());
    assert!(report.is_empty(), "{:#?}", report.iter().map(ToString::to_string).collect::<Vec<_>>());
}

#[test]
fn conversion_is_deterministic() {
    let converter = Converter::new(registry()).with_options(options());
    let first = serialize_to_string(&converter.convert_str(SAMPLE_SET).unwrap().document);
    let second = serialize_to_string(&converter.convert_str(SAMPLE_SET).unwrap().document);
    assert_eq!(first, second);
}

#[test]
fn header_comments_precede_the_first_section() {
    let conversion = Converter::new(registry())
        .with_options(options())
        .convert_str(SAMPLE_SET)
        .unwrap();
    let comments = conversion
        .document
        .preamble()
        .iter()
        .filter(|line| matches!(line, BodyLine::Comment(_)))
        .count();
    assert_eq!(comments, 3);
}

#[test]
fn files_are_read_and_named_in_the_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Demo Organ.Organ_Hauptwerk_xml");
    let mut bytes = UTF8_BOM.to_vec();
    bytes.extend_from_slice(SAMPLE_SET.as_bytes());
    fs::write(&path, bytes).unwrap();

    let options = ConversionOptions::new()
        .with_timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap());
    let conversion = convert_file(&path, registry(), options).unwrap();
    let text = serialize_to_string(&conversion.document);
    assert!(text.contains("; Source: Demo Organ.Organ_Hauptwerk_xml\r\n"));

    let missing = convert_file(&dir.path().join("absent.xml"), registry(), ConversionOptions::new());
    assert!(matches!(missing, Err(ConvertError::Io { .. })));
}

#[test]
fn broken_descriptors_fail() {
    let converter = Converter::new(registry());
    assert!(matches!(
        converter.convert_str("<Organ></Organ>"),
        Err(ConvertError::NotHauptwerk { .. })
    ));
    assert!(matches!(
        converter.convert_str("<Hauptwerk><ObjectList ObjectType=\"Rank\"></Hauptwerk>"),
        Err(ConvertError::Xml { .. })
    ));
}

#[test]
fn empty_descriptor_still_yields_a_main_windchest() {
    let conversion = Converter::new(registry())
        .with_options(options())
        .convert_str("<Hauptwerk/>")
        .unwrap();
    let document = &conversion.document;
    assert_eq!(
        section(document, "WindchestGroup", ObjectId::indexed(1)),
        "Name=Main\nNumberOfEnclosures=0\nNumberOfTremulants=0"
    );
    let organ = document.resolve("Organ", ObjectId::SINGLETON).expect("Organ");
    assert_eq!(organ.value("ChurchName"), Some("Converted organ"));
    assert_eq!(organ.value("NumberOfManuals"), Some("0"));
}

#[test]
fn source_values_outside_their_range_never_reach_the_output() {
    let xml = SAMPLE_SET
        .replace(
            "<Pitch_ExactSamplePitch>69.0</Pitch_ExactSamplePitch>",
            "<Pitch_ExactSamplePitch>-5</Pitch_ExactSamplePitch>",
        )
        .replace(
            "<Pitch_NormalMIDINoteNumber>36</Pitch_NormalMIDINoteNumber>",
            "<Pitch_NormalMIDINoteNumber>200</Pitch_NormalMIDINoteNumber>",
        )
        .replace(
            "<NormalMIDINoteNumber>41</NormalMIDINoteNumber>",
            "<NormalMIDINoteNumber>300</NormalMIDINoteNumber>",
        );
    let conversion = Converter::new(registry())
        .with_options(options())
        .convert_str(&xml)
        .unwrap();
    let rendered: Vec<String> = conversion.diagnostics.iter().map(ToString::to_string).collect();
    for expected in [
        "Sample 5001: Pitch_ExactSamplePitch=-5 is outside [1 - 100000]; value ignored",
        "Sample 5000: Pitch_NormalMIDINoteNumber=200 is outside [0 - 127]; value ignored",
        "Pipe_SoundEngine01 2005: NormalMIDINoteNumber=300 is outside [0 - 127]",
        "Pipe 2001: sample 5001 gives no exact pitch",
    ] {
        assert!(
            rendered.iter().any(|line| line.ends_with(expected)),
            "{expected} not in {rendered:#?}"
        );
    }

    let text = serialize_to_string(&conversion.document);
    assert!(!text.contains("NaN"), "{text}");
    let rank = section(&conversion.document, "Rank", ObjectId::indexed(1));
    assert!(rank.contains("Pipe001=OrganInstallationPackages\\000001\\Principal\\036-c.wav"));
    assert!(!rank.contains("Pipe001PitchTuning"));
    assert!(rank.contains("Pipe002=EMPTY"), "{rank}");

    let odf = registry().odf();
    let reparsed = parse_str(&text, odf);
    let report = validate(&reparsed.document, odf, &ValidationOptions::default());
    assert!(report.is_empty(), "{:#?}", report.iter().map(ToString::to_string).collect::<Vec<_>>());
}

#[test]
fn keyboard_sizes_stay_within_what_manuals_accept() {
    let xml = SAMPLE_SET.replace(
        "<KeyGen_NumberOfKeys>5</KeyGen_NumberOfKeys>",
        "<KeyGen_NumberOfKeys>500</KeyGen_NumberOfKeys>",
    );
    let conversion = Converter::new(registry())
        .with_options(options())
        .convert_str(&xml)
        .unwrap();
    assert!(
        conversion
            .diagnostics
            .iter()
            .any(|d| d.to_string().ends_with("Keyboard 1: KeyGen_NumberOfKeys=500 is outside [1 - 192]; value ignored")),
        "{:#?}",
        conversion.diagnostics
    );

    let document = &conversion.document;
    let manual = document.resolve("Manual", ObjectId::indexed(1)).expect("Manual001");
    assert_eq!(manual.value("NumberOfLogicalKeys"), Some("61"));
    let stop = document.resolve("Stop", ObjectId::indexed(1)).expect("Stop001");
    assert_eq!(stop.value("NumberOfAccessiblePipes"), Some("61"));

    let text = serialize_to_string(document);
    let odf = registry().odf();
    let report = validate(&parse_str(&text, odf).document, odf, &ValidationOptions::default());
    assert!(report.is_empty(), "{:#?}", report.iter().map(ToString::to_string).collect::<Vec<_>>());
}
