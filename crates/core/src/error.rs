/// Errors produced by the pure core modules.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unknown job: {0}")]
    UnknownJob(String),
}
