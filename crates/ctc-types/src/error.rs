use thiserror::Error;

/// Errors produced while validating or decoding domain input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid like type: {0} (expected post or project)")]
    InvalidLikeTarget(String),

    #[error("invalid tags: {0}")]
    InvalidTags(String),
}
