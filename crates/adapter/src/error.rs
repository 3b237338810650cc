//! Error types for the adapter crate.
//!
//! Adapter operations facing the auction host never fail; they degrade to safe
//! defaults. Errors only surface at the edges: loading settings, serializing
//! the outbound payload and decoding raw vendor bytes. Those edges return
//! `Report<AdapterError>` so callers get the full context chain.

use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum AdapterError {
    /// Settings could not be read or merged.
    #[display("Configuration error: {message}")]
    Configuration { message: String },

    /// Settings were read but failed validation.
    #[display("Invalid settings: {message}")]
    InvalidSettings { message: String },

    /// Outbound payload could not be serialized.
    #[display("Payload error: {message}")]
    Payload { message: String },

    /// Vendor response body could not be decoded.
    #[display("Response error: {message}")]
    Response { message: String },
}
