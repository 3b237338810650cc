//! Replay tool for the SpotIM bid adapter.
//!
//! Loads adapter settings the same way a host would, feeds host-shaped JSON
//! fixtures through the adapter, and renders what the adapter hands back.

pub mod commands;
pub mod error;
pub mod logging;
