//! Required and conditionally required attributes, including every
//! instance of a required template up to its count.

use odf_model::{Diagnostic, RuleId};
use odf_standards::AttributeDef;

use super::ObjectCheck;

pub(super) fn check(check: &ObjectCheck<'_>, out: &mut Vec<Diagnostic>) {
    let ctx = check.predicate_context();
    for def in check.schema.attributes() {
        if def.requirement.is_optional() || !def.requirement.applies(&ctx) {
            continue;
        }
        for name in required_spellings(check, def) {
            if check.object.has_attribute(&name) {
                continue;
            }
            let message = match &def.default {
                Some(default) => format!("{name} is required (GrandOrgue assumes {default})"),
                None => format!("{name} is required"),
            };
            out.push(
                Diagnostic::new(RuleId::MissingRequiredAttribute, message)
                    .with_object(check.at())
                    .with_attribute(name)
                    .with_line(check.object.header_line_number()),
            );
        }
    }
}

/// Concrete names a required definition demands on this object.
fn required_spellings(check: &ObjectCheck<'_>, def: &AttributeDef) -> Vec<String> {
    let Some(template) = &def.template else {
        return vec![def.name.clone()];
    };
    // Uncounted templates (index ranges) are never individually required.
    let Some(outer) = template.count_attribute(0, &[]) else {
        return Vec::new();
    };
    let mut names = Vec::new();
    for n in 1..=check.count(&outer) {
        if template.placeholders() == 1 {
            names.push(template.instantiate(&[n]));
            continue;
        }
        let Some(inner) = template.count_attribute(1, &[n]) else {
            continue;
        };
        for m in 1..=check.count(&inner) {
            names.push(template.instantiate(&[n, m]));
        }
    }
    names
}
