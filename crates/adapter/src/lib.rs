//! SpotIM bid adapter for client-side header-bidding auction hosts.
//!
//! The host hands the adapter bid requests and shared auction context; the
//! adapter answers with HTTP descriptors, normalized bids, user syncs and win
//! notifications. The host owns all transport.
//!
//! # Modules
//!
//! - [`auction`]: Host contract (traits, input and output types) and adapter registry
//! - [`constants`]: Wire constants and defaults
//! - [`device`]: Device classification from the user agent
//! - [`error`]: Error types and error handling utilities
//! - [`integrations`]: Individual bid adapters
//! - [`schain`]: Supply-chain string encoding
//! - [`settings`]: Configuration management and validation
//! - [`test_support`]: Testing utilities and mocks

pub mod auction;
pub mod constants;
pub mod device;
pub mod error;
pub mod integrations;
pub mod schain;
pub mod settings;
