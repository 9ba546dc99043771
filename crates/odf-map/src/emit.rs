//! Generated objects before they are typed against the organ schema.

use odf_ingest::{fill_required_defaults, make_entry};
use odf_model::{BodyLine, ObjectId, OrganObject, SectionName};
use odf_standards::{PanelFormat, SchemaSet};

use crate::error::ConvertError;

/// Section name plus attributes in output order.
#[derive(Debug, Clone)]
pub(crate) struct Draft {
    type_name: &'static str,
    id: ObjectId,
    values: Vec<(String, String)>,
}

impl Draft {
    pub(crate) fn new(type_name: &'static str, id: ObjectId) -> Self {
        Self {
            type_name,
            id,
            values: Vec::new(),
        }
    }

    pub(crate) fn indexed(type_name: &'static str, index: u32) -> Self {
        Self::new(type_name, ObjectId::indexed(index))
    }

    pub(crate) fn set(&mut self, name: impl Into<String>, value: impl ToString) -> &mut Self {
        self.values.push((name.into(), value.to_string()));
        self
    }

    pub(crate) fn set_opt<T: ToString>(&mut self, name: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.set(name, value);
        }
        self
    }

    /// `NumberOfX=k` followed by `X001..X00k`.
    pub(crate) fn list<T: ToString>(&mut self, count: &str, item: &str, values: &[T]) -> &mut Self {
        self.set(count, values.len());
        for (n, value) in values.iter().enumerate() {
            self.set(format!("{item}{:03}", n + 1), value.to_string());
        }
        self
    }

    /// Types every value and appends the required attributes GrandOrgue
    /// would otherwise assume, in declaration order.
    pub(crate) fn realise(self, set: &SchemaSet) -> Result<OrganObject, ConvertError> {
        let schema = set.schema_for(self.type_name)?;
        let mut object = OrganObject::new(SectionName::new(self.type_name, self.id));
        for (key, value) in &self.values {
            object.push_line(BodyLine::Attribute(make_entry(schema, set, key, value)));
        }

        fill_required_defaults(&mut object, schema, set, PanelFormat::New);
        Ok(object)
    }
}
