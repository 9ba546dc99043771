//! Runs every rule over a document and collects one ordered report.

use std::time::Instant;

use odf_ingest::structural_diagnostics;
use odf_model::{Diagnostic, DiagnosticReport, Document};
use odf_standards::{PanelFormat, SchemaSet};
use tracing::{debug, info, info_span};

use crate::checks::ObjectCheck;
use crate::cross_object;
use crate::options::ValidationOptions;
use crate::order;

/// Validator bound to one schema set.
///
/// Validation never stops early: every rule runs over every object and the
/// report is recomputed from the current document state on each call.
#[derive(Debug, Clone)]
pub struct Validator<'a> {
    set: &'a SchemaSet,
    options: ValidationOptions,
}

impl<'a> Validator<'a> {
    pub fn new(set: &'a SchemaSet) -> Self {
        Self {
            set,
            options: ValidationOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    pub fn run(&self, document: &Document) -> DiagnosticReport {
        let span = info_span!("validate", objects = document.object_count());
        let _guard = span.enter();
        let start = Instant::now();

        let panel_format = PanelFormat::detect(document);
        let mut diagnostics = structural_diagnostics(document, self.set);
        debug!(count = diagnostics.len(), "structural findings");

        self.per_object(document, panel_format, &mut diagnostics);
        cross_object::check(
            document,
            self.set,
            panel_format,
            self.options.check_orphans,
            &mut diagnostics,
        );
        order::sort(&mut diagnostics, document, self.set);

        let report = DiagnosticReport::new(diagnostics);
        info!(
            errors = report.error_count(),
            warnings = report.warning_count(),
            panel_format = panel_format.as_str(),
            duration_ms = start.elapsed().as_millis(),
            "validation complete"
        );
        report
    }

    fn per_object(&self, document: &Document, panel_format: PanelFormat, out: &mut Vec<Diagnostic>) {
        for (position, object) in document.positioned_objects() {
            let Some(schema) = self.set.get(object.type_name()) else {
                continue;
            };
            ObjectCheck {
                object,
                position,
                schema,
                set: self.set,
                panel_format,
                options: &self.options,
            }
            .run(out);
        }
    }
}

/// Validates `document` against `set` in one call.
pub fn validate(document: &Document, set: &SchemaSet, options: &ValidationOptions) -> DiagnosticReport {
    Validator::new(set).with_options(options.clone()).run(document)
}
