//! Bid adapters for individual demand partners.
//!
//! Each adapter lives in its own module and exposes a `register_adapters`
//! builder picked up by `crate::auction::build_adapters`.

pub mod spotim;
