//! Conditional requirements ("required only if a sibling has code X").
//!
//! Conditions are written as data in the object schemas and compiled once
//! into closures when the registry loads.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use odf_model::{Document, ObjectId, OrganObject};
use serde::{Deserialize, Serialize};

/// Panel layout generation of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelFormat {
    /// Display metrics live on `[Organ]`; no `PanelNNNElementNNN` sections.
    Old,
    /// `[Panel000]` declares `NumberOfGUIElements`.
    New,
}

impl PanelFormat {
    pub fn detect(document: &Document) -> Self {
        let new = document
            .resolve("Panel", ObjectId::indexed(0))
            .is_some_and(|panel| panel.has_attribute("NumberOfGUIElements"));
        if new { PanelFormat::New } else { PanelFormat::Old }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PanelFormat::Old => "old",
            PanelFormat::New => "new",
        }
    }
}

impl fmt::Display for PanelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read access to the sibling attributes a condition inspects.
pub trait AttributeLookup {
    /// Trimmed value of the attribute with canonical name `name`.
    fn lookup(&self, name: &str) -> Option<&str>;
}

impl AttributeLookup for OrganObject {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.value(name)
    }
}

impl AttributeLookup for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(|value| value.trim())
    }
}

/// What a predicate can see while it is evaluated.
pub struct PredicateContext<'a> {
    pub attributes: &'a dyn AttributeLookup,
    pub panel_format: PanelFormat,
}

impl<'a> PredicateContext<'a> {
    pub fn new(attributes: &'a dyn AttributeLookup, panel_format: PanelFormat) -> Self {
        Self {
            attributes,
            panel_format,
        }
    }
}

pub type Predicate = Arc<dyn Fn(&PredicateContext<'_>) -> bool + Send + Sync>;

/// Condition as written in the schema files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    All {
        all: Vec<Condition>,
    },
    Any {
        any: Vec<Condition>,
    },
    Panel {
        panel_format: PanelFormat,
    },
    Equals {
        attribute: String,
        equals: String,
    },
    OneOf {
        attribute: String,
        #[serde(rename = "in")]
        values: Vec<String>,
    },
    NotIn {
        attribute: String,
        not_in: Vec<String>,
    },
    AbsentOr {
        attribute: String,
        absent_or: Vec<String>,
    },
}

impl Condition {
    pub fn compile(&self) -> Predicate {
        match self.clone() {
            Condition::All { all } => {
                let parts: Vec<Predicate> = all.iter().map(Condition::compile).collect();
                Arc::new(move |ctx| parts.iter().all(|part| part(ctx)))
            }
            Condition::Any { any } => {
                let parts: Vec<Predicate> = any.iter().map(Condition::compile).collect();
                Arc::new(move |ctx| parts.iter().any(|part| part(ctx)))
            }
            Condition::Panel { panel_format } => {
                Arc::new(move |ctx| ctx.panel_format == panel_format)
            }
            Condition::Equals { attribute, equals } => Arc::new(move |ctx| {
                ctx.attributes
                    .lookup(&attribute)
                    .is_some_and(|value| value.eq_ignore_ascii_case(&equals))
            }),
            Condition::OneOf { attribute, values } => Arc::new(move |ctx| {
                ctx.attributes
                    .lookup(&attribute)
                    .is_some_and(|value| contains(&values, value))
            }),
            Condition::NotIn { attribute, not_in } => Arc::new(move |ctx| {
                ctx.attributes
                    .lookup(&attribute)
                    .is_none_or(|value| !contains(&not_in, value))
            }),
            Condition::AbsentOr {
                attribute,
                absent_or,
            } => Arc::new(move |ctx| {
                ctx.attributes
                    .lookup(&attribute)
                    .is_none_or(|value| contains(&absent_or, value))
            }),
        }
    }
}

fn contains(values: &[String], value: &str) -> bool {
    values.iter().any(|v| v.eq_ignore_ascii_case(value))
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, parts: &[Condition], sep: &str| {
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{part}")?;
            }
            Ok(())
        };
        match self {
            Condition::All { all } => join(f, all, " and "),
            Condition::Any { any } => join(f, any, " or "),
            Condition::Panel { panel_format } => write!(f, "panel format is {panel_format}"),
            Condition::Equals { attribute, equals } => write!(f, "{attribute}={equals}"),
            Condition::OneOf { attribute, values } => {
                write!(f, "{attribute} in [{}]", values.join(", "))
            }
            Condition::NotIn { attribute, not_in } => {
                write!(f, "{attribute} not in [{}]", not_in.join(", "))
            }
            Condition::AbsentOr {
                attribute,
                absent_or,
            } => write!(f, "{attribute} absent or in [{}]", absent_or.join(", ")),
        }
    }
}

/// A condition together with its compiled closure.
#[derive(Clone)]
pub struct CompiledCondition {
    condition: Condition,
    predicate: Predicate,
}

impl CompiledCondition {
    pub fn new(condition: Condition) -> Self {
        let predicate = condition.compile();
        Self {
            condition,
            predicate,
        }
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn evaluate(&self, ctx: &PredicateContext<'_>) -> bool {
        (self.predicate)(ctx)
    }
}

impl fmt::Debug for CompiledCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompiledCondition")
            .field(&self.condition)
            .finish()
    }
}
