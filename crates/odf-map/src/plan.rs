//! Cross-object bookkeeping shared by the mapping passes.

use std::collections::BTreeMap;

use odf_model::Diagnostic;

use crate::foreign::{ForeignOrgan, skipped};
use crate::ids::IdMap;

#[derive(Debug, Clone, Default)]
pub(crate) struct ManualPlan {
    pub name: String,
    pub keys: i64,
    pub first_note: i64,
    pub stops: Vec<u32>,
    pub divisionals: Vec<u32>,
    pub switches: Vec<u32>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RankPlan {
    pub first_note: i64,
    pub pipe_count: i64,
}

/// What a foreign switch ends up driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Controlled {
    /// Stop at 1-based position `local` of `manual`.
    Stop { manual: u32, local: u32 },
    Tremulant(u32),
}

pub(crate) struct Plan<'f> {
    pub foreign: &'f ForeignOrgan,
    pub ids: IdMap,
    pub diagnostics: Vec<Diagnostic>,
    /// Generated manual index to its layout.
    pub manuals: BTreeMap<u32, ManualPlan>,
    /// Foreign division to the generated manual playing it.
    pub division_manual: BTreeMap<u32, u32>,
    /// Generated rank index to its pipe range.
    pub ranks: BTreeMap<u32, RankPlan>,
    /// Foreign switch to the stops and tremulants it engages.
    pub switch_targets: BTreeMap<u32, Vec<Controlled>>,
}

impl<'f> Plan<'f> {
    pub fn new(foreign: &'f ForeignOrgan, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            foreign,
            ids: IdMap::new(),
            diagnostics,
            manuals: BTreeMap::new(),
            division_manual: BTreeMap::new(),
            ranks: BTreeMap::new(),
            switch_targets: BTreeMap::new(),
        }
    }

    pub fn skip(&mut self, object: String, reason: String) {
        self.diagnostics.push(skipped(object, reason));
    }
}

/// `Name` of a foreign object, or `"{fallback} {index}"`.
pub(crate) fn name_or(name: Option<&str>, fallback: &str, index: u32) -> String {
    name.map_or_else(|| format!("{fallback} {index}"), str::to_string)
}
