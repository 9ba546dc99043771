//! Derived lookup tables over a document's objects.

use std::collections::HashMap;

use serde::Serialize;

use crate::document::Section;
use crate::ids::{ObjectHandle, ObjectId};

/// Two objects of one type declaring the same identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Collision {
    /// Section position of the object the index resolves to.
    pub first: usize,
    pub duplicate: usize,
}

/// An attribute pointing at an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceSite {
    pub from: ObjectHandle,
    pub position: usize,
    pub attribute: String,
}

/// `(type, id) -> section position`, plus the reverse reference map.
///
/// Never edited in place; the owning document drops it on structural edits
/// and rebuilds it on the next lookup.
#[derive(Debug, Clone, Default)]
pub struct CrossRefIndex {
    by_type: HashMap<String, HashMap<ObjectId, usize>>,
    collisions: Vec<Collision>,
    referrers: HashMap<String, HashMap<ObjectId, Vec<ReferenceSite>>>,
}

impl CrossRefIndex {
    pub fn build(sections: &[Section]) -> Self {
        let mut index = Self::default();
        for (position, section) in sections.iter().enumerate() {
            let Section::Object(object) = section else {
                continue;
            };
            let ids = index
                .by_type
                .entry(object.type_name().to_string())
                .or_default();
            match ids.get(&object.id()) {
                Some(&first) => index.collisions.push(Collision {
                    first,
                    duplicate: position,
                }),
                None => {
                    ids.insert(object.id(), position);
                }
            }

            for entry in object.attributes() {
                for (target, id) in entry.typed().targets() {
                    index
                        .referrers
                        .entry(target.to_string())
                        .or_default()
                        .entry(id)
                        .or_default()
                        .push(ReferenceSite {
                            from: object.handle(),
                            position,
                            attribute: entry.key().to_string(),
                        });
                }
            }
        }
        index
    }

    pub fn lookup(&self, type_name: &str, id: ObjectId) -> Option<usize> {
        self.by_type.get(type_name)?.get(&id).copied()
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    pub fn referrers(&self, type_name: &str, id: ObjectId) -> &[ReferenceSite] {
        self.referrers
            .get(type_name)
            .and_then(|ids| ids.get(&id))
            .map_or(&[], Vec::as_slice)
    }

    pub fn is_referenced(&self, type_name: &str, id: ObjectId) -> bool {
        !self.referrers(type_name, id).is_empty()
    }

    /// Number of distinct `(type, id)` keys.
    pub fn len(&self) -> usize {
        self.by_type.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
