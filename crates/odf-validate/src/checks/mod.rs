//! Per-object attribute rules.

mod files;
mod presence;
mod values;

use odf_model::{Diagnostic, ObjectRef, OrganObject};
use odf_standards::{ObjectSchema, PanelFormat, PredicateContext, SchemaSet};

use crate::options::ValidationOptions;

/// One object under check, with everything the rules may consult.
pub(crate) struct ObjectCheck<'a> {
    pub object: &'a OrganObject,
    pub position: usize,
    pub schema: &'a ObjectSchema,
    pub set: &'a SchemaSet,
    pub panel_format: PanelFormat,
    pub options: &'a ValidationOptions,
}

impl ObjectCheck<'_> {
    pub fn at(&self) -> ObjectRef {
        ObjectRef::of(self.object, self.position)
    }

    pub fn predicate_context(&self) -> PredicateContext<'_> {
        PredicateContext::new(self.object, self.panel_format)
    }

    /// Integer value of a count attribute; absent or unparsable counts are 0.
    pub fn count(&self, name: &str) -> u32 {
        self.object
            .typed(name)
            .and_then(odf_model::TypedValue::as_integer)
            .map_or(0, |value| value.clamp(0, 999) as u32)
    }

    pub fn run(&self, out: &mut Vec<Diagnostic>) {
        presence::check(self, out);
        values::check(self, out);
        if let Some(dir) = &self.options.sample_dir {
            files::check(self, dir, out);
        }
    }
}
