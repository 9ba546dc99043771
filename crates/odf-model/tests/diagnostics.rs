use odf_model::{Diagnostic, DiagnosticReport, ObjectRef, RuleId, Severity};

#[test]
fn report_serializes_with_lowercase_severities() {
    let report = DiagnosticReport::new(vec![
        Diagnostic::new(RuleId::DanglingReference, "Switch099 does not exist")
            .with_object(ObjectRef::named("Stop001"))
            .with_attribute("Switch001")
            .with_line(Some(12)),
        Diagnostic::new(RuleId::OrphanObject, "no Manual lists Stop002")
            .with_object(ObjectRef::named("Stop002")),
    ]);
    assert_eq!(report.diagnostics[1].severity, Severity::Warning);

    insta::assert_json_snapshot!(report, @r#"
    {
      "diagnostics": [
        {
          "rule": "DanglingReference",
          "severity": "error",
          "object": {
            "name": "Stop001"
          },
          "attribute": "Switch001",
          "line": 12,
          "message": "Switch099 does not exist"
        },
        {
          "rule": "OrphanObject",
          "severity": "warning",
          "object": {
            "name": "Stop002"
          },
          "message": "no Manual lists Stop002"
        }
      ]
    }
    "#);
}

#[test]
fn severity_can_be_overridden() {
    let diagnostic = Diagnostic::new(RuleId::UnknownEnumCode, "'9' is not a known code")
        .with_severity(Severity::Error);
    insta::assert_snapshot!(diagnostic.to_string(), @"error[UnknownEnumCode]: '9' is not a known code");
}
