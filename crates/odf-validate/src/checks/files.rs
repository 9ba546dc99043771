use std::path::Path;

use odf_model::{Diagnostic, PipeSample, RuleId, TypedValue};

use super::ObjectCheck;

/// Sample and image paths must exist below `dir`. Paths are written with
/// Windows separators in most organ definitions.
pub(super) fn check(check: &ObjectCheck<'_>, dir: &Path, out: &mut Vec<Diagnostic>) {
    for entry in check.object.attributes() {
        let Some(matched) = check.schema.resolve_key(entry.key()) else {
            continue;
        };
        if !matched.def.kind.is_file_like() {
            continue;
        }
        let is_path = match entry.typed() {
            TypedValue::Sample(sample) => matches!(sample, PipeSample::File),
            TypedValue::Invalid { .. } => false,
            _ => true,
        };
        if !is_path {
            continue;
        }
        let relative = entry.value().replace('\\', "/");
        if !dir.join(&relative).is_file() {
            out.push(
                Diagnostic::new(
                    RuleId::MissingFile,
                    format!("{} not found under {}", entry.value(), dir.display()),
                )
                .with_object(check.at())
                .with_attribute(entry.name())
                .with_line(entry.line_number()),
            );
        }
    }
}
