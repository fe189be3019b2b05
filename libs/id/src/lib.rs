//! # pokedex-id
//!
//! Identity types for creature records.
//!
//! A creature can be addressed three ways:
//!
//! - by its store-assigned id, `crt_{ulid}` (immutable, generated on insert)
//! - by its sequence number, a small positive integer chosen by the caller
//! - by its name (handled by the service, not this crate)
//!
//! Store-assigned ids use a prefixed format so that a caller-supplied string
//! can be recognised as an id purely by its syntax:
//!
//! - `crt_01HV4Z2WQXKJNM8GPQY6VBKC3D`
//! - `req_01HV4Z3MXNKPQR9HSTZ7WCLD4E`

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
