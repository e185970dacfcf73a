// Domain Layer - Pure logic: address derivation and the command it feeds

pub mod address;
pub mod command;
pub mod error;

// Re-exports
pub use address::{
    decode_hex_payload, derive_address, encode_ss58, hex_payload, DerivedAddress,
    DEFAULT_SS58_FORMAT,
};
pub use command::ContractCall;
pub use error::DomainError;
