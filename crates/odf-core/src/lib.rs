#![deny(unsafe_code)]

//! The editing surface shared by the command line and any interactive
//! front end: one [`Session`] per open organ definition.

pub mod error;
pub mod session;

pub use error::SessionError;
pub use session::Session;
