use odf_model::{Diagnostic, Document, Section};
use odf_standards::SchemaSet;

/// Sorts diagnostics deterministically: document-level findings first,
/// then by section position, then by attribute declaration order. Object
/// findings without an attribute lead their object; unknown keys trail it.
/// Ties keep emission order.
pub(crate) fn sort(diagnostics: &mut [Diagnostic], document: &Document, set: &SchemaSet) {
    diagnostics.sort_by_cached_key(|diagnostic| {
        let position = diagnostic.position();
        let rank = position.map_or(0, |position| attribute_rank(diagnostic, position, document, set));
        (position, rank)
    });
}

fn attribute_rank(diagnostic: &Diagnostic, position: usize, document: &Document, set: &SchemaSet) -> usize {
    let Some(attribute) = &diagnostic.attribute else {
        return 0;
    };
    let schema = match document.sections().get(position) {
        Some(Section::Object(object)) => set.get(object.type_name()),
        _ => None,
    };
    match schema {
        Some(schema) => schema.position_of(attribute).saturating_add(1),
        None => usize::MAX,
    }
}
