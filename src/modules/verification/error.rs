use thiserror::Error;

/// Business-rule violations of the verification workflow. These are caller
/// errors, never retried, and each maps to a structured HTTP rejection.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Instructor already verified.")]
    AlreadyVerified,

    #[error("Verification already under review.")]
    DuplicatePending,

    #[error("At least one verification document is required.")]
    NoDocuments,

    #[error("{0}")]
    InvalidDocument(String),

    #[error("rejection_reason is required.")]
    MissingReason,

    #[error("Only pending submissions can be reviewed.")]
    InvalidState,

    #[error("Submission not found.")]
    NotFound,
}
