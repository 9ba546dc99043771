use odf_model::ObjectHandle;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Standards(#[from] odf_standards::StandardsError),

    #[error(transparent)]
    Ingest(#[from] odf_ingest::IngestError),

    #[error(transparent)]
    Output(#[from] odf_output::OutputError),

    #[error(transparent)]
    Convert(#[from] odf_map::ConvertError),

    #[error(transparent)]
    Model(#[from] odf_model::ModelError),

    #[error("'{name}' is not an object of the organ definition format: {reason}")]
    InvalidSection { name: String, reason: String },

    #[error("[{name}] already exists")]
    DuplicateObject { name: String },

    #[error("{object} has no attribute named {name}")]
    UnknownAttribute { object: String, name: String },

    #[error("value of {name} must stay on one line")]
    MultilineValue { name: String },

    #[error("no object with handle {handle} in the session")]
    UnknownObject { handle: ObjectHandle },

    #[error("the session has no file to save to; use save_as")]
    NoPath,
}
