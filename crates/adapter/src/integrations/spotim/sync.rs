//! User sync negotiation and post-auction sync collection.

use serde_json::Value as Json;

use crate::auction::types::{
    FilterSettings, ServerResponse, SyncFilter, SyncMethod, SyncRule, SyncType, UserSync,
    UserSyncOptions,
};

/// Sync method to announce to the vendor before the auction.
///
/// Iframe is preferred when either the `all` or the `iframe` rule includes
/// the bidder. Pixel is used when no filters are configured, no image rule
/// exists, or the image rule allows the bidder.
pub(crate) fn allowed_sync_method(
    filter_settings: Option<&FilterSettings>,
    bidder_code: &str,
) -> Option<SyncMethod> {
    let Some(filters) = filter_settings else {
        return Some(SyncMethod::Pixel);
    };

    let iframe_allowed = [filters.all.as_ref(), filters.iframe.as_ref()]
        .into_iter()
        .any(|rule| is_sync_method_allowed(rule, bidder_code));
    if iframe_allowed {
        return Some(SyncMethod::Iframe);
    }

    if filters.image.is_none() || is_sync_method_allowed(filters.image.as_ref(), bidder_code) {
        return Some(SyncMethod::Pixel);
    }

    None
}

fn is_sync_method_allowed(rule: Option<&SyncRule>, bidder_code: &str) -> bool {
    let Some(rule) = rule else {
        return false;
    };
    if rule.filter != SyncFilter::Include {
        return false;
    }

    // Anything other than a list (usually "*") names only the current bidder.
    match &rule.bidders {
        Json::Array(bidders) => bidders.iter().any(|b| b.as_str() == Some(bidder_code)),
        _ => true,
    }
}

/// Syncs returned in-band by the vendor, filtered by what the host allows.
pub(crate) fn user_syncs(options: &UserSyncOptions, responses: &[ServerResponse]) -> Vec<UserSync> {
    let mut syncs = Vec::new();

    for params in responses.iter().filter_map(|r| r.body.params.as_ref()) {
        if options.iframe_enabled {
            if let Some(url) = params.user_sync_url.as_deref().filter(|u| !u.is_empty()) {
                syncs.push(UserSync {
                    sync_type: SyncType::Iframe,
                    url: url.to_string(),
                });
            }
        }

        if options.pixel_enabled {
            if let Some(pixels) = &params.user_sync_pixels {
                syncs.extend(pixels.iter().filter(|u| !u.is_empty()).map(|url| UserSync {
                    sync_type: SyncType::Image,
                    url: url.clone(),
                }));
            }
        }
    }

    syncs
}
