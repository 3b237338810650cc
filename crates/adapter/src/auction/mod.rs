//! Host-facing contract for bid adapters.
//!
//! This module defines what the auction host hands to an adapter, what the
//! adapter hands back, and how adapters are discovered from settings.
//!
//! Note: Individual adapters are located in the `integrations` module
//! (e.g., `crate::integrations::spotim`).

use crate::settings::Settings;
use std::sync::Arc;

pub mod adapter;
pub mod types;

pub use adapter::{BidAdapter, FloorProvider, PixelTrigger};
pub use types::{
    AuctionEnvironment, BidRequest, BidderRequest, Creative, MediaType, NormalizedBid,
    ServerRequest, ServerResponse, UserSync, UserSyncOptions,
};

/// Type alias for adapter builder functions.
type AdapterBuilder = fn(&Settings) -> Vec<Arc<dyn BidAdapter>>;

/// Returns the list of all available adapter builder functions.
///
/// Each builder checks the settings for its own `[adapters.<id>]` table and
/// returns the adapter when it is enabled.
fn adapter_builders() -> &'static [AdapterBuilder] {
    &[crate::integrations::spotim::register_adapters]
}

/// Build every enabled adapter for the current settings.
#[must_use]
pub fn build_adapters(settings: &Settings) -> Vec<Arc<dyn BidAdapter>> {
    let adapters: Vec<Arc<dyn BidAdapter>> = adapter_builders()
        .iter()
        .flat_map(|builder| builder(settings))
        .collect();

    log::info!("Registered {} bid adapters", adapters.len());

    adapters
}
