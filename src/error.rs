//! Error types returned by this crate's key derivation and MCF codec.

use thiserror::Error;

/// Errors that can occur while deriving a key or encoding/decoding an MCF record.
///
/// All operations in this crate are fallible and recoverable: nothing here
/// panics on bad input, so callers are always free to reject a malformed
/// password record, reject a policy-violating parameter set, or surface
/// resource limits back to a human rather than aborting the process.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ScryptError {
    /// A Scrypt parameter (`N`, `r`, `p`) or the requested output length is
    /// invalid, either trivially (zero, not a power of two) or because it
    /// causes the derivation's internal arithmetic to overflow.
    #[error("invalid scrypt parameters: {0}")]
    InvalidParams(&'static str),

    /// The output buffer requested is outside `1..=(2^32-1)*32` bytes.
    #[error("invalid output length")]
    InvalidOutputLen,

    /// The salt supplied to `scrypt_mcf` is outside the length this crate's
    /// `$s1$` format supports (1 to 16 bytes).
    #[error("invalid salt length: {0}")]
    InvalidSaltLen(&'static str),

    /// The computed memory footprint of `N`/`r` exceeds the limit the caller
    /// is willing to allocate. `required` and `limit` are both in bytes, so
    /// the caller can log why a derivation was rejected without
    /// recomputing the footprint itself.
    #[error("scrypt memory footprint {required} bytes exceeds limit {limit} bytes")]
    MemoryLimitExceeded { required: u64, limit: u64 },

    /// An MCF record is not a well-formed `$s1$...` string.
    #[error("invalid MCF record: {0}")]
    InvalidMcfFormat(&'static str),
}
