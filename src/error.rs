use std::path::PathBuf;

use thiserror::Error;

/// Problems with the settings read from the environment
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("`{0}` must be set to a non-empty value")]
    Missing(&'static str),
    #[error("`port` must be a number between 0 and 65535, got {0:?}")]
    InvalidPort(String),
}

/// Fatal conditions that stop the whole batch before (or instead of) sending
#[derive(Debug, Error)]
pub enum MailerError {
    #[error("configuration invalid: {0}")]
    Config(#[from] ConfigError),

    #[error("csv file not found")]
    MissingCsvPath,

    #[error("template file not found")]
    MissingTemplatePath,

    #[error("failed to read {path:?}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse recipients from {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("failed to set up smtp transport: {0}")]
    TransportSetup(#[source] lettre::transport::smtp::Error),

    #[error("smtp transport verification failed: {0}")]
    TransportVerificationFailed(String),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("line {line}: expected 4 fields, found {found}")]
    FieldCount { line: u64, found: usize },
}

/// Failure to deliver to a single recipient, never fatal for the batch
#[derive(Debug, Error)]
pub enum SendError {
    #[error("invalid address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("transport rejected message: {0}")]
    Transport(String),
}
