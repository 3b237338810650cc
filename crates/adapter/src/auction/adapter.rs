//! Trait definitions for bid adapters and the host capabilities they consume.

use error_stack::Report;

use crate::error::AdapterError;

use super::types::{
    AuctionEnvironment, BidRequest, BidderRequest, FloorQuery, FloorResult, MediaType,
    NormalizedBid, ServerRequest, ServerResponse, UserSync, UserSyncOptions,
};

/// Trait implemented by every bid adapter the host can load.
///
/// Each method maps onto one host extension point. None of them perform I/O;
/// the host owns transport, timing and rendering.
pub trait BidAdapter: Send + Sync {
    /// Bidder code the host registers this adapter under (e.g., "spotim").
    fn bidder_code(&self) -> &str;

    /// Check if this adapter supports a specific media type.
    fn supports_media_type(&self, media_type: MediaType) -> bool {
        // By default, support banner ads
        matches!(media_type, MediaType::Banner)
    }

    /// Validity gate applied by the host before a bid reaches `build_requests`.
    fn is_bid_request_valid(&self, bid: &BidRequest) -> bool;

    /// Build the HTTP descriptors for a batch of validated bid requests.
    ///
    /// Returns an empty list when no request in the batch passes validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the outbound payload cannot be serialized.
    fn build_requests(
        &self,
        bids: &[BidRequest],
        bidder_request: &BidderRequest,
        env: &AuctionEnvironment,
    ) -> Result<Vec<ServerRequest>, Report<AdapterError>>;

    /// Map a vendor response into normalized bids.
    fn interpret_response(&self, response: &ServerResponse) -> Vec<NormalizedBid>;

    /// Collect the user syncs to drop once the auction has completed.
    fn user_syncs(
        &self,
        _options: &UserSyncOptions,
        _responses: &[ServerResponse],
    ) -> Vec<UserSync> {
        Vec::new()
    }

    /// Called by the host when one of this adapter's bids wins.
    fn on_bid_won(&self, _bid: &NormalizedBid, _pixels: &dyn PixelTrigger) {}
}

/// Host floor module, queried once per bid request.
pub trait FloorProvider: Send + Sync {
    /// Return the floor for the query, or `None` when no rule applies.
    fn get_floor(&self, query: &FloorQuery<'_>) -> Option<FloorResult>;
}

/// Host capability to fire a one-shot tracking request.
pub trait PixelTrigger {
    /// Fire and forget. The host owns the request and ignores its response.
    fn trigger_pixel(&self, url: &str);
}
