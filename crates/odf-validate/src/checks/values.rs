use odf_model::{AttributeEntry, Diagnostic, RuleId, TypedValue};
use odf_standards::{AttributeMatch, ValueKind};

use super::ObjectCheck;

pub(super) fn check(check: &ObjectCheck<'_>, out: &mut Vec<Diagnostic>) {
    for entry in check.object.attributes() {
        let Some(matched) = check.schema.resolve_key(entry.key()) else {
            continue;
        };
        if matched.def.is_template() {
            index_in_bounds(check, entry, &matched, out);
        }
        value_in_range(check, entry, &matched, out);
    }
}

fn index_in_bounds(
    check: &ObjectCheck<'_>,
    entry: &AttributeEntry,
    matched: &AttributeMatch<'_>,
    out: &mut Vec<Diagnostic>,
) {
    let Some(template) = &matched.def.template else {
        return;
    };
    for (level, &index) in matched.indices.iter().enumerate() {
        let problem = match template.count_attribute(level, &matched.indices) {
            Some(count_name) => {
                let count = check.count(&count_name);
                (index == 0 || index > count).then(|| {
                    format!("{} is beyond {count_name}={count}", entry.key())
                })
            }
            None => {
                let (low, high) = template.index_range();
                (index < low || index > high)
                    .then(|| format!("{} is outside indices {low:03}-{high:03}", entry.key()))
            }
        };
        if let Some(message) = problem {
            out.push(
                Diagnostic::new(RuleId::IndexBeyondCount, message)
                    .with_object(check.at())
                    .with_attribute(entry.name())
                    .with_line(entry.line_number()),
            );
            return;
        }
    }
}

fn value_in_range(
    check: &ObjectCheck<'_>,
    entry: &AttributeEntry,
    matched: &AttributeMatch<'_>,
    out: &mut Vec<Diagnostic>,
) {
    let def = matched.def;
    let finding = match entry.typed() {
        TypedValue::Integer { value } => out_of_range(def.range.contains(*value as f64), entry, def),
        TypedValue::Real { value } => out_of_range(def.range.contains(*value), entry, def),
        TypedValue::Reference(reference) => reference.id.index.and_then(|index| {
            out_of_range(def.range.contains(f64::from(index)), entry, def)
        }),
        TypedValue::Code { label: None } => match &def.kind {
            ValueKind::Code { table } => Some((
                RuleId::UnknownEnumCode,
                format!("'{}' is not a known {table} code", entry.value()),
            )),
            _ => None,
        },
        _ => None,
    };
    if let Some((rule, message)) = finding {
        out.push(
            Diagnostic::new(rule, message)
                .with_object(check.at())
                .with_attribute(entry.name())
                .with_line(entry.line_number()),
        );
    }
}

fn out_of_range(
    inside: bool,
    entry: &AttributeEntry,
    def: &odf_standards::AttributeDef,
) -> Option<(RuleId, String)> {
    (!inside).then(|| {
        (
            RuleId::OutOfRangeValue,
            format!("{} is outside {}", entry.value(), def.range),
        )
    })
}
