#![deny(unsafe_code)]

mod checks;
mod cross_object;
mod engine;
mod options;
mod order;

pub use engine::{Validator, validate};
pub use options::ValidationOptions;
