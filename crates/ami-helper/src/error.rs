//! Error types for AMI lookups

use thiserror::Error;

use crate::client::TransportError;

/// Everything that can go wrong between a CLI argument and a printed row
#[derive(Error, Debug)]
pub enum AmiError {
    #[error("Unknown scope: {name} (legal ones: {legal})")]
    UnknownScope { name: String, legal: String },

    #[error("Unknown hash scope: {name} (legal ones: {legal})")]
    UnknownHashScope { name: String, legal: String },

    #[error("No campaign matches dataset {0}")]
    NoCampaign(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid AMI response: {0}")]
    Validation(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
