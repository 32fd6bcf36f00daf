use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error(
        "invalid cutoff timestamp '{0}': expected RFC 3339 or 'YYYY-MM-DD HH:MM:SS[.ffffff] +HH:MM'"
    )]
    Cutoff(String),

    #[error("empty user identifier")]
    EmptyUserId,
}
