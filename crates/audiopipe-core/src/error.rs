use thiserror::Error;

/// Errors shared across crate boundaries because they describe the data
/// model itself rather than what a particular crate does with it.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("audio config is not fully specified: {field} is unset")]
    Incomplete { field: &'static str },
}
