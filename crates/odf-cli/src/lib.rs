//! Library side of the `odfedit` command line tool.

pub mod commands;
pub mod logging;
pub mod types;
