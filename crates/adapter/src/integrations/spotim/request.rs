//! Outbound payload for the SpotIM `hb-multi-si` endpoint.
//!
//! One payload is built per adapter call: shared account/site/privacy fields
//! under `params` and one entry per valid bid request under `bids`.

use serde::Serialize;
use serde_json::Value as Json;

use crate::auction::types::{
    loose_number, AuctionEnvironment, BidRequest, BidderRequest, FloorCapability, FloorQuery,
    MediaType, Size, SyncMethod, VideoMediaType,
};
use crate::constants::{ADAPTER_VERSION, DEFAULT_CURRENCY, FLOOR_SIZE_WILDCARD, WRAPPER_TYPE};
use crate::device::DeviceType;
use crate::schain::encode_supply_chain;

use super::sync::allowed_sync_method;

pub(crate) const PRODUCTION_MODE_PATH: &str = "hb-multi-si";
pub(crate) const TEST_MODE_PATH: &str = "hb-multi-si-test";

/// Body POSTed to the vendor endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundPayload {
    pub params: CommonParams,
    pub bids: Vec<BidParams>,
}

/// Account, site, device and privacy fields shared by every bid.
#[derive(Debug, Clone, Serialize)]
pub struct CommonParams {
    pub wrapper_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapper_vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapper_version: Option<String>,
    pub adapter_version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auction_start: Option<u64>,
    pub publisher_id: String,
    pub publisher_name: String,
    pub site_domain: String,
    pub dnt: u8,
    pub device_type: DeviceType,
    pub ua: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmax: Option<u32>,
    #[serde(rename = "userIds", skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_metadata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cs_method: Option<SyncMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub us_privacy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gdpr: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gdpr_consent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ifa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
}

/// Per-slot parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidParams {
    #[serde(flatten)]
    pub media: MediaParams,
    pub ad_unit_code: String,
    pub sizes: Vec<Size>,
    pub floor_price: f64,
    pub bid_id: String,
    pub bidder_request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sua: Option<Json>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coppa: Option<u8>,
}

/// Media branch of a bid. Video carries its protocol fields; banner none.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mediaType", rename_all = "lowercase")]
pub enum MediaParams {
    Banner,
    Video(VideoParams),
}

impl MediaParams {
    #[must_use]
    pub fn media_type(&self) -> MediaType {
        match self {
            MediaParams::Banner => MediaType::Banner,
            MediaParams::Video(_) => MediaType::Video,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_method: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linearity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocols: Option<Vec<u32>>,
}

/// Endpoint path segment for the batch: test when any bid asks for it.
pub(crate) fn mode_path(bids: &[&BidRequest]) -> &'static str {
    let test_mode = bids
        .iter()
        .any(|bid| bid.params.as_ref().is_some_and(|p| p.test_mode));
    if test_mode {
        TEST_MODE_PATH
    } else {
        PRODUCTION_MODE_PATH
    }
}

/// Build the payload for a non-empty batch of validated bids.
pub(crate) fn build_payload(
    bids: &[&BidRequest],
    bidder_request: &BidderRequest,
    env: &AuctionEnvironment,
    bidder_code: &str,
) -> Option<OutboundPayload> {
    let first = bids.first()?;
    Some(OutboundPayload {
        params: common_params(first, bidder_request, env, bidder_code),
        bids: bids.iter().copied().map(bid_params).collect(),
    })
}

fn common_params(
    first: &BidRequest,
    bidder_request: &BidderRequest,
    env: &AuctionEnvironment,
    bidder_code: &str,
) -> CommonParams {
    let params = first.params.clone().unwrap_or_default();
    let domain = env.location.hostname.clone();

    let cs_method = if env.user_sync.sync_enabled {
        allowed_sync_method(env.user_sync.filter_settings.as_ref(), bidder_code)
    } else {
        None
    };

    let gdpr = bidder_request
        .gdpr_consent
        .as_ref()
        .filter(|consent| consent.gdpr_applies);

    let schain = bidder_request
        .schain
        .as_ref()
        .or(first.schain.as_ref())
        .map(encode_supply_chain);

    let (referrer, page_url) = match &bidder_request.referer_info {
        Some(info) => (
            info.referrer.clone(),
            Some(
                info.page
                    .clone()
                    .filter(|page| !page.is_empty())
                    .unwrap_or_else(|| env.location.href.clone()),
            ),
        ),
        None => (None, None),
    };

    CommonParams {
        wrapper_type: WRAPPER_TYPE,
        wrapper_vendor: env.wrapper.vendor.clone(),
        wrapper_version: env.wrapper.version.clone(),
        adapter_version: ADAPTER_VERSION,
        auction_start: bidder_request.auction_start,
        publisher_id: params.org.unwrap_or_default(),
        publisher_name: domain.clone(),
        site_domain: domain,
        dnt: u8::from(env.do_not_track()),
        device_type: DeviceType::from_user_agent(&env.user_agent),
        ua: env.user_agent.clone(),
        session_id: first.auction_id.clone(),
        tmax: env.bidder_timeout_ms,
        user_ids: first.user_id.as_ref().and_then(to_json_string),
        site_metadata: bidder_request.ortb2.site.as_ref().and_then(to_json_string),
        user_metadata: bidder_request.ortb2.user.as_ref().and_then(to_json_string),
        cs_method,
        us_privacy: bidder_request
            .usp_consent
            .clone()
            .filter(|usp| !usp.is_empty()),
        gdpr: gdpr.map(|consent| consent.gdpr_applies),
        gdpr_consent: gdpr.and_then(|consent| consent.consent_string.clone()),
        ifa: params.ifa.filter(|ifa| !ifa.is_empty()),
        schain,
        referrer,
        page_url,
    }
}

fn bid_params(bid: &BidRequest) -> BidParams {
    let params = bid.params.clone().unwrap_or_default();
    let banner = bid.media_types.banner.as_ref();
    let video = bid.media_types.video.as_ref();

    // Banner wins when both are declared.
    let (media, sizes, pos, name, mimes, api) = if let Some(banner) = banner {
        (
            MediaParams::Banner,
            banner.sizes.clone(),
            banner.pos,
            banner.name.clone(),
            banner.mimes.clone(),
            banner.api.clone(),
        )
    } else {
        let video_sizes = video
            .map(|v| {
                if v.sizes.is_empty() {
                    v.player_size.clone()
                } else {
                    v.sizes.clone()
                }
            })
            .unwrap_or_default();
        (
            MediaParams::Video(video.map(video_params).unwrap_or_default()),
            video_sizes,
            video.and_then(|v| v.pos),
            video.and_then(|v| v.name.clone()),
            video.and_then(|v| v.mimes.clone()),
            video.and_then(|v| v.api.clone()),
        )
    };

    let sizes = if sizes.is_empty() {
        bid.sizes.clone()
    } else {
        sizes
    };

    BidParams {
        floor_price: floor_price(bid, media.media_type()),
        media,
        ad_unit_code: bid.ad_unit_code.clone(),
        sizes,
        bid_id: bid.bid_id.clone(),
        bidder_request_id: bid.bidder_request_id.clone(),
        transaction_id: bid.transaction_id().map(str::to_string),
        pos,
        gpid: bid.gpid().map(str::to_string),
        placement_id: params.placement_id.filter(|id| !id.is_empty()).or(name),
        mimes,
        api,
        sua: bid.sua().cloned(),
        coppa: bid.coppa().then_some(1),
    }
}

fn video_params(video: &VideoMediaType) -> VideoParams {
    VideoParams {
        playback_method: video.playbackmethod.as_ref().and_then(first_playback_method),
        placement: video.placement,
        min_duration: video.minduration,
        max_duration: video.maxduration,
        skip: video.skip,
        linearity: video.linearity,
        protocols: video.protocols.clone(),
    }
}

/// The wire protocol takes a single playback method.
fn first_playback_method(value: &Json) -> Option<u64> {
    match value {
        Json::Array(methods) => methods.first().and_then(Json::as_u64),
        other => other.as_u64(),
    }
}

/// `max(provider floor, manual floor)`, never negative.
pub(crate) fn floor_price(bid: &BidRequest, media_type: MediaType) -> f64 {
    let provider = bid
        .floor_provider
        .as_ref()
        .map_or(0.0, |capability| provider_floor(capability, media_type));
    let manual = manual_floor(bid.params.as_ref().and_then(|p| p.floor_price.as_ref()));
    provider.max(manual).max(0.0)
}

fn provider_floor(capability: &FloorCapability, media_type: MediaType) -> f64 {
    let query = FloorQuery {
        currency: DEFAULT_CURRENCY,
        media_type,
        size: FLOOR_SIZE_WILDCARD,
    };

    match capability.0.get_floor(&query) {
        Some(result) if result.currency == DEFAULT_CURRENCY && result.floor.is_finite() => {
            result.floor
        }
        Some(result) => {
            log::debug!(
                "SpotIM: ignoring floor {} {} from floor provider",
                result.floor,
                result.currency
            );
            0.0
        }
        None => 0.0,
    }
}

/// Numbers and numeric strings count; anything else is zero.
fn manual_floor(value: Option<&Json>) -> f64 {
    value.and_then(loose_number).unwrap_or(0.0)
}

fn to_json_string(value: &Json) -> Option<String> {
    serde_json::to_string(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::types::{FloorResult, GdprConsent, RefererInfo};
    use crate::test_support::tests::{
        banner_bid_request, bidder_request, environment, video_bid_request, FixedFloorProvider,
    };
    use serde_json::json;

    fn payload_for(bids: &[BidRequest]) -> OutboundPayload {
        let refs: Vec<&BidRequest> = bids.iter().collect();
        build_payload(&refs, &bidder_request(), &environment(), "spotim")
            .expect("should build payload for non-empty batch")
    }

    #[test]
    fn build_payload_returns_none_for_empty_batch() {
        assert!(build_payload(&[], &bidder_request(), &environment(), "spotim").is_none());
    }

    #[test]
    fn mode_path_switches_on_test_mode_anywhere_in_batch() {
        let production = banner_bid_request();
        let mut test = video_bid_request();
        test.params.as_mut().expect("fixture has params").test_mode = true;

        assert_eq!(mode_path(&[&production]), PRODUCTION_MODE_PATH);
        assert_eq!(mode_path(&[&test]), TEST_MODE_PATH);
        assert_eq!(mode_path(&[&production, &test]), TEST_MODE_PATH);
    }

    #[test]
    fn common_params_carry_account_site_and_device_fields() {
        let payload = payload_for(&[banner_bid_request()]);
        let params = payload.params;

        assert_eq!(params.wrapper_type, "prebidjs");
        assert_eq!(params.adapter_version, ADAPTER_VERSION);
        assert_eq!(params.publisher_id, "org-1");
        assert_eq!(params.publisher_name, "publisher.example");
        assert_eq!(params.site_domain, "publisher.example");
        assert_eq!(params.session_id, "auction-1");
        assert_eq!(params.auction_start, Some(1_700_000_000_000));
        assert_eq!(params.tmax, Some(1500));
        assert_eq!(params.dnt, 0);
        assert_eq!(params.device_type, DeviceType::Desktop);
        assert_eq!(params.wrapper_vendor.as_deref(), Some("pbjs"));
        assert_eq!(
            params.referrer.as_deref(),
            Some("https://search.example/?q=news")
        );
        assert_eq!(
            params.page_url.as_deref(),
            Some("https://publisher.example/article")
        );
    }

    #[test]
    fn common_params_omit_absent_optional_fields() {
        let bid = banner_bid_request();
        let env = AuctionEnvironment::default();
        let bidder_request = BidderRequest::default();

        let payload = build_payload(&[&bid], &bidder_request, &env, "spotim")
            .expect("should build payload");
        let value = serde_json::to_value(&payload).expect("should serialize payload");
        let params = value["params"].as_object().expect("params is an object");

        for key in [
            "us_privacy",
            "gdpr",
            "gdpr_consent",
            "site_metadata",
            "user_metadata",
            "cs_method",
            "schain",
            "referrer",
            "page_url",
            "tmax",
            "auction_start",
            "ifa",
        ] {
            assert!(!params.contains_key(key), "{key} should be omitted");
        }
        assert!(
            params.values().all(|v| !v.is_null()),
            "no field should be null-filled"
        );
    }

    #[test]
    fn common_params_include_privacy_signals() {
        let bid = banner_bid_request();
        let mut bidder_request = bidder_request();
        bidder_request.usp_consent = Some("1YNN".to_string());
        bidder_request.gdpr_consent = Some(GdprConsent {
            gdpr_applies: true,
            consent_string: Some("CPXxRfAPXxRfAAfKABENB-CgAAAAAAAAAAYgAAAAAAAA".to_string()),
        });

        let payload = build_payload(&[&bid], &bidder_request, &environment(), "spotim")
            .expect("should build payload");

        assert_eq!(payload.params.us_privacy.as_deref(), Some("1YNN"));
        assert_eq!(payload.params.gdpr, Some(true));
        assert_eq!(
            payload.params.gdpr_consent.as_deref(),
            Some("CPXxRfAPXxRfAAfKABENB-CgAAAAAAAAAAYgAAAAAAAA")
        );
    }

    #[test]
    fn gdpr_fields_are_omitted_when_gdpr_does_not_apply() {
        let bid = banner_bid_request();
        let mut bidder_request = bidder_request();
        bidder_request.gdpr_consent = Some(GdprConsent {
            gdpr_applies: false,
            consent_string: Some("ignored".to_string()),
        });

        let payload = build_payload(&[&bid], &bidder_request, &environment(), "spotim")
            .expect("should build payload");

        assert_eq!(payload.params.gdpr, None);
        assert_eq!(payload.params.gdpr_consent, None);
    }

    #[test]
    fn common_params_serialize_metadata_and_user_ids_as_json_strings() {
        let mut bid = banner_bid_request();
        bid.user_id = Some(json!({ "pubcid": "abc" }));
        let mut bidder_request = bidder_request();
        bidder_request.ortb2.site = Some(json!({ "cat": ["IAB1"] }));
        bidder_request.ortb2.user = Some(json!({ "keywords": "sports" }));

        let payload = build_payload(&[&bid], &bidder_request, &environment(), "spotim")
            .expect("should build payload");

        assert_eq!(payload.params.user_ids.as_deref(), Some(r#"{"pubcid":"abc"}"#));
        assert_eq!(
            payload.params.site_metadata.as_deref(),
            Some(r#"{"cat":["IAB1"]}"#)
        );
        assert_eq!(
            payload.params.user_metadata.as_deref(),
            Some(r#"{"keywords":"sports"}"#)
        );
    }

    #[test]
    fn common_params_encode_schain_from_bidder_request() {
        let bid = banner_bid_request();
        let mut bidder_request = bidder_request();
        bidder_request.schain = Some(json!({
            "ver": "1.0",
            "complete": 1,
            "nodes": [{ "asi": "a.com", "sid": "1", "hp": 1, "rid": "r", "name": "n", "domain": "d" }]
        }));

        let payload = build_payload(&[&bid], &bidder_request, &environment(), "spotim")
            .expect("should build payload");

        assert_eq!(payload.params.schain.as_deref(), Some("1.0,1!a.com,1,1,r,n,d"));
    }

    #[test]
    fn common_params_fall_back_to_first_bid_schain() {
        let mut bid = banner_bid_request();
        bid.schain = Some(json!({ "ver": "1.0", "complete": 0, "nodes": [] }));

        let payload = payload_for(&[bid]);
        assert_eq!(payload.params.schain.as_deref(), Some("1.0,0"));
    }

    #[test]
    fn page_url_falls_back_to_location_href() {
        let bid = banner_bid_request();
        let mut bidder_request = bidder_request();
        bidder_request.referer_info = Some(RefererInfo {
            referrer: None,
            page: None,
        });

        let payload = build_payload(&[&bid], &bidder_request, &environment(), "spotim")
            .expect("should build payload");

        assert_eq!(payload.params.referrer, None);
        assert_eq!(
            payload.params.page_url.as_deref(),
            Some("https://publisher.example/article?utm=1")
        );
    }

    #[test]
    fn cs_method_is_set_only_when_sync_is_enabled() {
        let bid = banner_bid_request();
        let mut env = environment();

        env.user_sync.sync_enabled = false;
        let payload =
            build_payload(&[&bid], &bidder_request(), &env, "spotim").expect("should build");
        assert_eq!(payload.params.cs_method, None);

        env.user_sync.sync_enabled = true;
        let payload =
            build_payload(&[&bid], &bidder_request(), &env, "spotim").expect("should build");
        assert_eq!(payload.params.cs_method, Some(SyncMethod::Pixel));
    }

    #[test]
    fn dnt_and_device_type_come_from_environment() {
        let bid = banner_bid_request();
        let mut env = environment();
        env.do_not_track = Some("1".to_string());
        env.user_agent =
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) Mobile/15E148".to_string();

        let payload =
            build_payload(&[&bid], &bidder_request(), &env, "spotim").expect("should build");
        let value = serde_json::to_value(&payload.params).expect("should serialize");

        assert_eq!(value["dnt"], 1);
        assert_eq!(value["device_type"], "4");
        assert_eq!(value["ua"], env.user_agent.as_str());
    }

    #[test]
    fn banner_bid_params_serialize_expected_wire_shape() {
        let payload = payload_for(&[banner_bid_request()]);
        let value = serde_json::to_value(&payload.bids[0]).expect("should serialize bid");

        assert_eq!(value["mediaType"], "banner");
        assert_eq!(value["adUnitCode"], "div-banner");
        assert_eq!(value["sizes"], json!([[300, 250], [728, 90]]));
        assert_eq!(value["bidId"], "bid-1");
        assert_eq!(value["bidderRequestId"], "bidder-request-1");
        assert_eq!(value["transactionId"], "tid-1");
        assert_eq!(value["gpid"], "/1234/home#banner");
        assert_eq!(value["pos"], 1);
        assert_eq!(value["placementId"], "banner-placement");
        assert_eq!(value["floorPrice"], 0.5);
        for key in ["playbackMethod", "placement", "minDuration", "skip", "coppa"] {
            assert!(value.get(key).is_none(), "{key} should be omitted for banner");
        }
    }

    #[test]
    fn video_bid_params_carry_protocol_fields() {
        let payload = payload_for(&[video_bid_request()]);
        let bid = &payload.bids[0];

        assert_eq!(bid.sizes, vec![[640, 480]]);
        assert_eq!(
            bid.media,
            MediaParams::Video(VideoParams {
                playback_method: Some(2),
                placement: Some(1),
                min_duration: Some(5),
                max_duration: Some(30),
                skip: Some(1),
                linearity: Some(1),
                protocols: Some(vec![2, 3, 5, 6]),
            })
        );

        let value = serde_json::to_value(bid).expect("should serialize bid");
        assert_eq!(value["mediaType"], "video");
        assert_eq!(value["playbackMethod"], 2);
        assert_eq!(value["minDuration"], 5);
        assert_eq!(value["mimes"], json!(["video/mp4"]));
    }

    #[test]
    fn video_fields_are_omitted_when_absent() {
        let mut bid = video_bid_request();
        let video = bid.media_types.video.as_mut().expect("fixture has video");
        video.playbackmethod = None;
        video.skip = None;
        video.linearity = None;

        let payload = payload_for(&[bid]);
        let value = serde_json::to_value(&payload.bids[0]).expect("should serialize bid");
        for key in ["playbackMethod", "skip", "linearity"] {
            assert!(value.get(key).is_none(), "{key} should be omitted");
        }
        assert_eq!(value["placement"], 1);
    }

    #[test]
    fn single_playback_method_is_accepted() {
        assert_eq!(first_playback_method(&json!(3)), Some(3));
        assert_eq!(first_playback_method(&json!([1, 2])), Some(1));
        assert_eq!(first_playback_method(&json!([])), None);
        assert_eq!(first_playback_method(&json!("auto")), None);
    }

    #[test]
    fn banner_wins_when_both_media_types_are_declared() {
        let mut bid = banner_bid_request();
        bid.media_types.video = video_bid_request().media_types.video;

        let payload = payload_for(&[bid]);
        assert_eq!(payload.bids[0].media, MediaParams::Banner);
        assert_eq!(payload.bids[0].sizes, vec![[300, 250], [728, 90]]);
    }

    #[test]
    fn sizes_fall_back_to_legacy_sizes() {
        let mut bid = banner_bid_request();
        bid.media_types
            .banner
            .as_mut()
            .expect("fixture has banner")
            .sizes
            .clear();
        bid.sizes = vec![[320, 50]];

        let payload = payload_for(&[bid]);
        assert_eq!(payload.bids[0].sizes, vec![[320, 50]]);
    }

    #[test]
    fn placement_id_falls_back_to_media_type_name() {
        let mut bid = banner_bid_request();
        bid.params.as_mut().expect("fixture has params").placement_id = None;
        bid.media_types.banner.as_mut().expect("fixture has banner").name =
            Some("unit-name".to_string());

        let payload = payload_for(&[bid]);
        assert_eq!(payload.bids[0].placement_id.as_deref(), Some("unit-name"));
    }

    #[test]
    fn coppa_and_sua_are_forwarded() {
        let mut bid = banner_bid_request();
        bid.ortb2 = Some(json!({
            "device": { "sua": { "platform": { "brand": "macOS" } } },
            "regs": { "coppa": true }
        }));

        let payload = payload_for(&[bid]);
        assert_eq!(payload.bids[0].coppa, Some(1));
        assert_eq!(
            payload.bids[0].sua,
            Some(json!({ "platform": { "brand": "macOS" } }))
        );
    }

    #[test]
    fn floor_is_max_of_provider_and_manual() {
        let mut bid = banner_bid_request();
        bid.floor_provider = Some(FloorCapability::new(FixedFloorProvider::new(1.25, "USD")));
        assert_eq!(floor_price(&bid, MediaType::Banner), 1.25);

        bid.params.as_mut().expect("fixture has params").floor_price = Some(json!(2.0));
        assert_eq!(floor_price(&bid, MediaType::Banner), 2.0);
    }

    #[test]
    fn floor_ignores_provider_in_other_currency() {
        let mut bid = banner_bid_request();
        bid.params.as_mut().expect("fixture has params").floor_price = None;
        bid.floor_provider = Some(FloorCapability::new(FixedFloorProvider::new(3.0, "EUR")));
        assert_eq!(floor_price(&bid, MediaType::Banner), 0.0);
    }

    #[test]
    fn floor_queries_provider_with_usd_media_type_and_wildcard_size() {
        let provider = std::sync::Arc::new(FixedFloorProvider::new(0.1, "USD"));
        let mut bid = video_bid_request();
        bid.floor_provider = Some(FloorCapability(provider.clone()));

        let _ = payload_for(&[bid]);

        let queries = provider.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].0, "USD");
        assert_eq!(queries[0].1, MediaType::Video);
        assert_eq!(queries[0].2, "*");
    }

    #[test]
    fn floor_treats_invalid_manual_values_as_zero() {
        let mut bid = banner_bid_request();
        for value in [json!("abc"), json!(null), json!({}), json!([1])] {
            bid.params.as_mut().expect("fixture has params").floor_price = Some(value);
            assert_eq!(floor_price(&bid, MediaType::Banner), 0.0);
        }

        bid.params.as_mut().expect("fixture has params").floor_price = Some(json!("0.75"));
        assert_eq!(floor_price(&bid, MediaType::Banner), 0.75);
    }

    #[test]
    fn floor_is_never_negative() {
        let mut bid = banner_bid_request();
        bid.params.as_mut().expect("fixture has params").floor_price = Some(json!(-4));
        bid.floor_provider = Some(FloorCapability::new(FixedFloorProvider::new(-1.0, "USD")));
        assert_eq!(floor_price(&bid, MediaType::Banner), 0.0);
    }

    #[test]
    fn floor_defaults_to_zero_without_provider_or_param() {
        let mut bid = banner_bid_request();
        bid.params.as_mut().expect("fixture has params").floor_price = None;
        bid.floor_provider = None;
        assert_eq!(floor_price(&bid, MediaType::Banner), 0.0);
    }

    #[test]
    fn provider_returning_nothing_counts_as_zero() {
        struct NoFloor;
        impl crate::auction::FloorProvider for NoFloor {
            fn get_floor(&self, _query: &FloorQuery<'_>) -> Option<FloorResult> {
                None
            }
        }

        let mut bid = banner_bid_request();
        bid.params.as_mut().expect("fixture has params").floor_price = None;
        bid.floor_provider = Some(FloorCapability::new(NoFloor));
        assert_eq!(floor_price(&bid, MediaType::Banner), 0.0);
    }
}
