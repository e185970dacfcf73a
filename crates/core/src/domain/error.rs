// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid public key length: {0} bytes (expected 1, 2, 4, 8, 32 or 33)")]
    InvalidKeyLength(usize),

    #[error("Invalid SS58 network format: {0}")]
    InvalidFormat(u16),

    #[error("Invalid hex payload: {0}")]
    InvalidHex(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
