//! SpotIM bid adapter.
//!
//! Sends every valid bid request of an auction to the SpotIM `hb-multi-si`
//! endpoint in a single POST and maps the vendor's bids, sync URLs and win
//! notifications back onto the host contract.

use std::sync::Arc;

use error_stack::{Report, ResultExt};
use http::Method;
use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

use crate::auction::adapter::{BidAdapter, PixelTrigger};
use crate::auction::types::{
    AuctionEnvironment, BidRequest, BidderRequest, MediaType, NormalizedBid, ServerRequest,
    ServerResponse, UserSync, UserSyncOptions,
};
use crate::constants::DEFAULT_TTL_SECONDS;
use crate::error::AdapterError;
use crate::settings::{AdapterConfig, Settings};

mod request;
mod response;
mod sync;

pub use request::{BidParams, CommonParams, MediaParams, OutboundPayload, VideoParams};

/// Settings table id, `[adapters.spotim]`.
pub const SPOTIM_ADAPTER_ID: &str = "spotim";

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the SpotIM adapter.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SpotimConfig {
    /// Whether the adapter is registered
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Bidder code the host knows the adapter by
    #[serde(default = "default_bidder_code")]
    #[validate(length(min = 1))]
    pub bidder_code: String,

    /// Base URL; the production or test path is appended
    #[serde(default = "default_endpoint")]
    #[validate(url)]
    pub endpoint: String,

    /// TTL applied to bids that do not carry one
    #[serde(default = "default_ttl_seconds")]
    #[validate(range(min = 1))]
    pub ttl_seconds: u32,
}

fn default_enabled() -> bool {
    true
}

fn default_bidder_code() -> String {
    SPOTIM_ADAPTER_ID.to_string()
}

fn default_endpoint() -> String {
    "https://hb.spotimmedia.com/".to_string()
}

fn default_ttl_seconds() -> u32 {
    DEFAULT_TTL_SECONDS
}

impl Default for SpotimConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            bidder_code: default_bidder_code(),
            endpoint: default_endpoint(),
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

impl AdapterConfig for SpotimConfig {
    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

// ============================================================================
// Adapter
// ============================================================================

pub struct SpotimAdapter {
    config: SpotimConfig,
}

impl SpotimAdapter {
    #[must_use]
    pub fn new(config: SpotimConfig) -> Self {
        Self { config }
    }

    /// Full endpoint URL for the given mode path.
    fn endpoint_url(&self, mode_path: &str) -> Result<String, Report<AdapterError>> {
        let mut base = Url::parse(&self.config.endpoint).change_context(
            AdapterError::Configuration {
                message: format!("Invalid SpotIM endpoint: {}", self.config.endpoint),
            },
        )?;

        // Join relative to the configured path rather than replacing its last segment.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let url = base
            .join(mode_path)
            .change_context(AdapterError::Configuration {
                message: format!("Failed to build SpotIM endpoint for {mode_path}"),
            })?;
        Ok(url.into())
    }

    /// Bidder code used for sync filter matching.
    fn effective_bidder_code<'a>(&'a self, bidder_request: &'a BidderRequest) -> &'a str {
        if bidder_request.bidder_code.is_empty() {
            &self.config.bidder_code
        } else {
            &bidder_request.bidder_code
        }
    }
}

impl BidAdapter for SpotimAdapter {
    fn bidder_code(&self) -> &str {
        &self.config.bidder_code
    }

    fn supports_media_type(&self, media_type: MediaType) -> bool {
        matches!(media_type, MediaType::Banner | MediaType::Video)
    }

    fn is_bid_request_valid(&self, bid: &BidRequest) -> bool {
        let Some(params) = &bid.params else {
            log::warn!("SpotIM: no params have been set to SpotIM adapter");
            return false;
        };

        if params.org.as_deref().is_none_or(str::is_empty) {
            log::warn!("SpotIM: org is a mandatory param for SpotIM adapter");
            return false;
        }

        true
    }

    fn build_requests(
        &self,
        bids: &[BidRequest],
        bidder_request: &BidderRequest,
        env: &AuctionEnvironment,
    ) -> Result<Vec<ServerRequest>, Report<AdapterError>> {
        let valid: Vec<&BidRequest> = bids
            .iter()
            .filter(|bid| self.is_bid_request_valid(bid))
            .collect();

        let bidder_code = self.effective_bidder_code(bidder_request);
        let Some(payload) = request::build_payload(&valid, bidder_request, env, bidder_code)
        else {
            log::debug!("SpotIM: no valid bid requests, skipping");
            return Ok(Vec::new());
        };

        let url = self.endpoint_url(request::mode_path(&valid))?;
        let data = serde_json::to_value(&payload).change_context(AdapterError::Payload {
            message: "Failed to serialize SpotIM request".to_string(),
        })?;

        log::info!(
            "SpotIM: built request for {} of {} bid requests to {}",
            valid.len(),
            bids.len(),
            url
        );

        Ok(vec![ServerRequest {
            method: Method::POST,
            url,
            data,
        }])
    }

    fn interpret_response(&self, response: &ServerResponse) -> Vec<NormalizedBid> {
        let bids = response::interpret_response(response, self.config.ttl_seconds);
        log::debug!("SpotIM: interpreted {} bids", bids.len());
        bids
    }

    fn user_syncs(&self, options: &UserSyncOptions, responses: &[ServerResponse]) -> Vec<UserSync> {
        sync::user_syncs(options, responses)
    }

    fn on_bid_won(&self, bid: &NormalizedBid, pixels: &dyn PixelTrigger) {
        let Some(nurl) = bid.nurl.as_deref().filter(|u| !u.is_empty()) else {
            return;
        };
        log::info!("SpotIM: bid {} won, firing win notification", bid.request_id);
        pixels.trigger_pixel(nurl);
    }
}

/// Register the SpotIM adapter when `[adapters.spotim]` is present and enabled.
#[must_use]
pub fn register_adapters(settings: &Settings) -> Vec<Arc<dyn BidAdapter>> {
    let mut adapters: Vec<Arc<dyn BidAdapter>> = Vec::new();

    match settings.adapter_config::<SpotimConfig>(SPOTIM_ADAPTER_ID) {
        Ok(Some(config)) => {
            log::info!(
                "Registering SpotIM adapter (endpoint={}, bidder_code={})",
                config.endpoint,
                config.bidder_code
            );
            adapters.push(Arc::new(SpotimAdapter::new(config)));
        }
        Ok(None) => {
            log::info!("SpotIM adapter not registered: adapter not found or disabled");
        }
        Err(e) => {
            log::error!("SpotIM adapter not registered: config error: {e:?}");
        }
    }

    adapters
}
