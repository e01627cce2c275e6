use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("store query failed: {0}")]
pub struct StoreError(pub String);

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("failed to read roster: {0}")]
    Read(#[from] csv::Error),

    #[error("roster is empty")]
    Empty,

    #[error("duplicate roll number {0}")]
    DuplicateId(String),

    #[error("roster has more than two groups (found '{0}')")]
    TooManyGroups(String),

    #[error("unknown group '{0}'")]
    UnknownGroup(String),

    #[error("start position within group '{0}' must be at least 1")]
    InvalidStart(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum StartError {
    #[error("start position {position} is outside the roster (1..={len})")]
    OutOfRange { position: usize, len: usize },

    #[error("a session is already in progress")]
    Busy,
}

#[derive(Error, Debug, PartialEq)]
pub enum SubmissionError {
    #[error("failed to create session: {0}")]
    SessionCreate(StoreError),

    #[error("failed to write attendance: {0}")]
    AttendanceWrite(StoreError),

    #[error("attendance can only be submitted from the review screen")]
    NotReviewing,
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to read attendance history: {0}")]
    Read(#[from] StoreError),

    #[error("failed to write sheet: {0}")]
    Sink(String),
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ExportError::Sink(err.to_string())
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Sink(err.to_string())
    }
}

/// Query failures and unmatched credentials both surface as `Rejected`.
#[derive(Error, Debug, PartialEq)]
pub enum AuthError {
    #[error("invalid username or password")]
    Rejected,
}
