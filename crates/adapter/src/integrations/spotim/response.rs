//! Mapping from the vendor response body to normalized bids.

use crate::auction::types::{BidMeta, Creative, NormalizedBid, ServerResponse, VendorBid};
use crate::constants::DEFAULT_CURRENCY;

/// Normalize every bid in `response`.
///
/// A missing or empty `bids` array yields no bids. Bids with a media type
/// other than banner or video are dropped.
pub(crate) fn interpret_response(response: &ServerResponse, ttl_seconds: u32) -> Vec<NormalizedBid> {
    let Some(bids) = response.body.bids.as_deref() else {
        log::debug!("SpotIM: response carried no bids");
        return Vec::new();
    };

    bids.iter()
        .filter_map(|bid| normalize_bid(bid, ttl_seconds))
        .collect()
}

fn normalize_bid(bid: &VendorBid, ttl_seconds: u32) -> Option<NormalizedBid> {
    let creative = match bid.media_type.as_str() {
        "video" => Creative::Video {
            vast_xml: bid.vast_xml.clone().unwrap_or_default(),
        },
        "banner" => Creative::Banner {
            ad: bid.ad.clone().unwrap_or_default(),
        },
        other => {
            log::warn!(
                "SpotIM: dropping bid {} with unsupported media type '{}'",
                bid.request_id,
                other
            );
            return None;
        }
    };

    let advertiser_domains = bid
        .adomain
        .clone()
        .filter(|domains| !domains.is_empty());

    Some(NormalizedBid {
        request_id: bid.request_id.clone(),
        cpm: bid.cpm,
        currency: bid
            .currency
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        width: bid.width,
        height: bid.height,
        ttl: bid.ttl.filter(|ttl| *ttl > 0).unwrap_or(ttl_seconds),
        creative_id: bid.request_id.clone(),
        net_revenue: bid.net_revenue.unwrap_or(true),
        nurl: bid.nurl.clone().filter(|u| !u.is_empty()),
        meta: BidMeta {
            media_type: creative.media_type(),
            advertiser_domains,
        },
        creative,
    })
}
