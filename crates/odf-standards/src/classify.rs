//! Typing of raw attribute text against an attribute definition.

use odf_model::{ObjectId, PipeSample, Reference, TypedValue};

use crate::schema::{AttributeDef, ValueKind};
use crate::set::SchemaSet;

/// Interprets `raw` (surrounding whitespace ignored) as the kind `def`
/// declares. Values that do not fit become [`TypedValue::Invalid`]; range and
/// enumeration membership are left to the validator.
pub fn classify(def: &AttributeDef, raw: &str, set: &SchemaSet) -> TypedValue {
    let value = raw.trim();
    match &def.kind {
        ValueKind::Integer => parse_integer(value)
            .map(|value| TypedValue::Integer { value })
            .unwrap_or_else(|| invalid(format!("'{value}' is not an integer"))),
        ValueKind::Real => parse_real(value)
            .map(|value| TypedValue::Real { value })
            .unwrap_or_else(|| invalid(format!("'{value}' is not a number"))),
        ValueKind::Boolean => match value {
            "Y" => TypedValue::Boolean { value: true },
            "N" => TypedValue::Boolean { value: false },
            _ => invalid(format!("'{value}' is not Y or N")),
        },
        ValueKind::Text => TypedValue::Text,
        ValueKind::File => {
            if value.is_empty() {
                invalid("empty file name".to_string())
            } else {
                TypedValue::Text
            }
        }
        ValueKind::Colour { table } => {
            let label = table
                .as_deref()
                .and_then(|table| set.enum_table(table))
                .and_then(|table| table.label(value));
            match label {
                Some(label) => TypedValue::Code {
                    label: Some(label.to_string()),
                },
                None if is_html_colour(value) => TypedValue::Text,
                None => invalid(format!("'{value}' is not a colour name or #RRGGBB")),
            }
        }
        ValueKind::Code { table } => {
            if let Some(label) = set.enum_table(table).and_then(|t| t.label(value)) {
                return TypedValue::Code {
                    label: Some(label.to_string()),
                };
            }
            match parse_integer(value) {
                Some(number) if !def.range.is_unbounded() => TypedValue::Integer { value: number },
                _ => TypedValue::Code { label: None },
            }
        }
        ValueKind::Reference { target, signed } => {
            let (negated, digits) = match value.strip_prefix('-') {
                Some(rest) if *signed => (true, rest),
                _ => (false, value.strip_prefix('+').unwrap_or(value)),
            };
            match parse_index(digits) {
                Some(index) => TypedValue::Reference(Reference {
                    target: target.clone(),
                    id: ObjectId::indexed(index),
                    negated,
                }),
                None => invalid(format!("'{value}' is not a {target} number")),
            }
        }
        ValueKind::PipeSample => classify_sample(value),
    }
}

fn classify_sample(value: &str) -> TypedValue {
    if value == "EMPTY" {
        return TypedValue::Sample(PipeSample::Empty);
    }
    if let Some(rest) = value.strip_prefix("REF:") {
        let parts: Vec<Option<u32>> = rest.split(':').map(parse_index).collect();
        return match parts.as_slice() {
            [Some(manual), Some(stop), Some(pipe)] => TypedValue::Sample(PipeSample::Ref {
                manual: *manual,
                stop: *stop,
                pipe: *pipe,
            }),
            _ => invalid(format!("'{value}' is not of the form REF:mmm:sss:ppp")),
        };
    }
    let lower = value.to_ascii_lowercase();
    if lower.ends_with(".wav") || lower.ends_with(".wv") {
        TypedValue::Sample(PipeSample::File)
    } else {
        invalid(format!(
            "'{value}' is not EMPTY, REF:mmm:sss:ppp or a .wav/.wv file"
        ))
    }
}

fn invalid(reason: String) -> TypedValue {
    TypedValue::Invalid { reason }
}

pub(crate) fn parse_integer(value: &str) -> Option<i64> {
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn parse_real(value: &str) -> Option<f64> {
    let body = value.strip_prefix(['-', '+']).unwrap_or(value);
    let well_formed = !body.is_empty()
        && body.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && body.bytes().filter(|&b| b == b'.').count() <= 1
        && body.bytes().any(|b| b.is_ascii_digit());
    if !well_formed {
        return None;
    }
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_index(value: &str) -> Option<u32> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn is_html_colour(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].bytes().all(|b| b.is_ascii_hexdigit())
}
