//! Core types exchanged with the auction host.
//!
//! Inputs (`BidRequest`, `BidderRequest`, `AuctionEnvironment`) mirror the
//! shapes the host hands to bid adapters and deserialize from the host's
//! camelCase JSON. Outputs (`ServerRequest`, `NormalizedBid`, `UserSync`) are
//! what adapters hand back.

use std::fmt;
use std::sync::Arc;

use error_stack::{Report, ResultExt};
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::auction::adapter::FloorProvider;
use crate::error::AdapterError;

/// Creative size as `[width, height]`.
pub type Size = [u32; 2];

/// Media type enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Banner,
    Video,
    Native,
}

impl MediaType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Banner => "banner",
            MediaType::Video => "video",
            MediaType::Native => "native",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Bid request (one per ad slot)
// ============================================================================

/// Per-slot bid request handed to the adapter by the host.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidRequest {
    #[serde(default)]
    pub bidder: String,
    /// Vendor parameters; `None` when the publisher configured none at all.
    #[serde(default)]
    pub params: Option<BidderParams>,
    #[serde(default)]
    pub ad_unit_code: String,
    #[serde(default)]
    pub bid_id: String,
    #[serde(default)]
    pub bidder_request_id: String,
    #[serde(default)]
    pub auction_id: String,
    #[serde(default)]
    pub media_types: MediaTypes,
    /// Legacy flat size list, used when the media type carries none.
    #[serde(default)]
    pub sizes: Vec<Size>,
    /// Resolved user-id modules output.
    #[serde(default)]
    pub user_id: Option<Json>,
    #[serde(default)]
    pub schain: Option<Json>,
    #[serde(default)]
    pub ortb2_imp: Option<Json>,
    #[serde(default)]
    pub ortb2: Option<Json>,
    /// Host floor-module capability. Never part of the wire shape.
    #[serde(skip)]
    pub floor_provider: Option<FloorCapability>,
}

impl BidRequest {
    /// Transaction id from `ortb2Imp.ext.tid`.
    #[must_use]
    pub fn transaction_id(&self) -> Option<&str> {
        self.ortb2_imp
            .as_ref()
            .and_then(|imp| imp.pointer("/ext/tid"))
            .and_then(Json::as_str)
    }

    /// GPID from `ortb2Imp.ext.gpid`.
    #[must_use]
    pub fn gpid(&self) -> Option<&str> {
        self.ortb2_imp
            .as_ref()
            .and_then(|imp| imp.pointer("/ext/gpid"))
            .and_then(Json::as_str)
    }

    /// Structured user agent from `ortb2.device.sua`.
    #[must_use]
    pub fn sua(&self) -> Option<&Json> {
        self.ortb2.as_ref().and_then(|o| o.pointer("/device/sua"))
    }

    /// Whether `ortb2.regs.coppa` is set to a truthy value.
    #[must_use]
    pub fn coppa(&self) -> bool {
        self.ortb2
            .as_ref()
            .and_then(|o| o.pointer("/regs/coppa"))
            .is_some_and(is_truthy)
    }
}

/// Vendor params block of a bid request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidderParams {
    /// Vendor organization id. Accepts both string and integer from the page.
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub org: Option<String>,
    /// Manually configured floor; anything that is not a number counts as zero.
    #[serde(default)]
    pub floor_price: Option<Json>,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub placement_id: Option<String>,
    #[serde(default)]
    pub test_mode: bool,
    /// Identifier for advertising, forwarded as-is.
    #[serde(default)]
    pub ifa: Option<String>,
}

/// Custom deserializer for ids that may arrive as a string or an integer.
fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

/// Media type declarations of an ad unit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaTypes {
    #[serde(default)]
    pub banner: Option<BannerMediaType>,
    #[serde(default)]
    pub video: Option<VideoMediaType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BannerMediaType {
    #[serde(default)]
    pub sizes: Vec<Size>,
    #[serde(default)]
    pub pos: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mimes: Option<Vec<String>>,
    #[serde(default)]
    pub api: Option<Vec<u32>>,
}

/// Instream video declaration. Field names follow the `OpenRTB` video object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoMediaType {
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub sizes: Vec<Size>,
    #[serde(default, rename = "playerSize")]
    pub player_size: Vec<Size>,
    #[serde(default)]
    pub pos: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mimes: Option<Vec<String>>,
    #[serde(default)]
    pub api: Option<Vec<u32>>,
    #[serde(default)]
    pub protocols: Option<Vec<u32>>,
    /// Either a single integer or a list of integers.
    #[serde(default)]
    pub playbackmethod: Option<Json>,
    #[serde(default)]
    pub placement: Option<u32>,
    #[serde(default)]
    pub minduration: Option<u32>,
    #[serde(default)]
    pub maxduration: Option<u32>,
    #[serde(default)]
    pub skip: Option<u32>,
    #[serde(default)]
    pub linearity: Option<u32>,
}

/// Host floor capability attached to a bid request.
#[derive(Clone)]
pub struct FloorCapability(pub Arc<dyn FloorProvider>);

impl FloorCapability {
    pub fn new(provider: impl FloorProvider + 'static) -> Self {
        Self(Arc::new(provider))
    }
}

impl fmt::Debug for FloorCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FloorCapability(..)")
    }
}

/// Query passed to a floor provider.
#[derive(Debug, Clone, PartialEq)]
pub struct FloorQuery<'a> {
    pub currency: &'a str,
    pub media_type: MediaType,
    pub size: &'a str,
}

/// Floor returned by a floor provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FloorResult {
    pub floor: f64,
    pub currency: String,
}

// ============================================================================
// Shared auction context
// ============================================================================

/// Context shared by every bid request of one adapter call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidderRequest {
    #[serde(default)]
    pub bidder_code: String,
    #[serde(default)]
    pub auction_start: Option<u64>,
    #[serde(default)]
    pub referer_info: Option<RefererInfo>,
    #[serde(default)]
    pub usp_consent: Option<String>,
    #[serde(default)]
    pub gdpr_consent: Option<GdprConsent>,
    #[serde(default)]
    pub ortb2: Ortb2,
    #[serde(default)]
    pub schain: Option<Json>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefererInfo {
    #[serde(default, rename = "ref")]
    pub referrer: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GdprConsent {
    #[serde(default)]
    pub gdpr_applies: bool,
    #[serde(default)]
    pub consent_string: Option<String>,
}

/// First-party `OpenRTB` 2.x metadata supplied by the publisher.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ortb2 {
    #[serde(default)]
    pub site: Option<Json>,
    #[serde(default)]
    pub user: Option<Json>,
}

/// Browser and host state the adapter would otherwise read from globals.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionEnvironment {
    #[serde(default)]
    pub location: PageLocation,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub do_not_track: Option<String>,
    #[serde(default)]
    pub ms_do_not_track: Option<String>,
    /// Host-wide bidder timeout in milliseconds.
    #[serde(default)]
    pub bidder_timeout_ms: Option<u32>,
    #[serde(default)]
    pub user_sync: UserSyncConfig,
    #[serde(default)]
    pub wrapper: WrapperInfo,
}

impl AuctionEnvironment {
    /// Do-not-track as the browser reports it (`"1"`/`"yes"`, or the legacy
    /// `msDoNotTrack == "1"`).
    #[must_use]
    pub fn do_not_track(&self) -> bool {
        matches!(self.do_not_track.as_deref(), Some("yes" | "1"))
            || self.ms_do_not_track.as_deref() == Some("1")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageLocation {
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub href: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WrapperInfo {
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

// ============================================================================
// User sync
// ============================================================================

/// Publisher-level user sync configuration held by the host.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSyncConfig {
    #[serde(default)]
    pub sync_enabled: bool,
    #[serde(default)]
    pub filter_settings: Option<FilterSettings>,
}

/// Sync filter rules keyed by mechanism.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterSettings {
    #[serde(default)]
    pub all: Option<SyncRule>,
    #[serde(default)]
    pub iframe: Option<SyncRule>,
    #[serde(default)]
    pub image: Option<SyncRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncRule {
    /// A list of bidder codes, or `"*"` for every bidder.
    #[serde(default)]
    pub bidders: Json,
    /// A rule without a filter never includes anyone.
    #[serde(default)]
    pub filter: SyncFilter,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncFilter {
    Include,
    Exclude,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Sync mechanism negotiated with the vendor ahead of the auction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncMethod {
    Iframe,
    Pixel,
}

/// Which sync mechanisms the host allows after the auction.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSyncOptions {
    #[serde(default)]
    pub iframe_enabled: bool,
    #[serde(default)]
    pub pixel_enabled: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncType {
    Iframe,
    Image,
}

/// One sync the host should drop after the auction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSync {
    #[serde(rename = "type")]
    pub sync_type: SyncType,
    pub url: String,
}

// ============================================================================
// HTTP exchange
// ============================================================================

/// HTTP descriptor returned to the host transport.
#[derive(Debug, Clone)]
pub struct ServerRequest {
    pub method: Method,
    pub url: String,
    pub data: Json,
}

impl ServerRequest {
    /// Serialize the request body as the host transport sends it.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be serialized to JSON text.
    pub fn body_string(&self) -> Result<String, Report<AdapterError>> {
        serde_json::to_string(&self.data).change_context(AdapterError::Payload {
            message: "Failed to serialize request body".to_string(),
        })
    }
}

/// Vendor HTTP response as delivered by the host transport.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerResponse {
    #[serde(default)]
    pub body: VendorResponseBody,
}

impl ServerResponse {
    /// Decode a raw vendor response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a JSON object of the vendor shape.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Report<AdapterError>> {
        let body = serde_json::from_slice(bytes).change_context(AdapterError::Response {
            message: "Failed to parse vendor response body".to_string(),
        })?;
        Ok(Self { body })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VendorResponseBody {
    /// Bids that could be decoded. A malformed entry is dropped on its own.
    #[serde(default, deserialize_with = "deserialize_vendor_bids")]
    pub bids: Option<Vec<VendorBid>>,
    #[serde(default)]
    pub params: Option<VendorResponseParams>,
}

/// Sync URLs the vendor returns in-band.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VendorResponseParams {
    #[serde(default, rename = "userSyncURL")]
    pub user_sync_url: Option<String>,
    #[serde(default, rename = "userSyncPixels")]
    pub user_sync_pixels: Option<Vec<String>>,
}

fn deserialize_vendor_bids<'de, D>(deserializer: D) -> Result<Option<Vec<VendorBid>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let Some(raw) = Option::<Vec<Json>>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let bids = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<VendorBid>(value) {
            Ok(bid) => Some(bid),
            Err(e) => {
                log::warn!("Dropping malformed vendor bid at index {index}: {e}");
                None
            }
        })
        .collect();
    Ok(Some(bids))
}

/// One bid as returned by the vendor endpoint.
///
/// Numeric fields accept numbers, numeric strings or null.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorBid {
    #[serde(default)]
    pub request_id: String,
    #[serde(default, deserialize_with = "deserialize_loose_f64")]
    pub cpm: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_u32")]
    pub width: u32,
    #[serde(default, deserialize_with = "deserialize_loose_u32")]
    pub height: u32,
    #[serde(default, deserialize_with = "deserialize_loose_opt_u32")]
    pub ttl: Option<u32>,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub ad: Option<String>,
    #[serde(default)]
    pub vast_xml: Option<String>,
    #[serde(default)]
    pub nurl: Option<String>,
    #[serde(default)]
    pub adomain: Option<Vec<String>>,
    #[serde(default)]
    pub net_revenue: Option<bool>,
}

// ============================================================================
// Normalized bid
// ============================================================================

/// Bid in the host's normalized shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedBid {
    pub request_id: String,
    pub cpm: f64,
    pub currency: String,
    pub width: u32,
    pub height: u32,
    pub ttl: u32,
    pub creative_id: String,
    pub net_revenue: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nurl: Option<String>,
    #[serde(flatten)]
    pub creative: Creative,
    pub meta: BidMeta,
}

/// Creative payload, one field per supported media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mediaType", rename_all = "lowercase")]
pub enum Creative {
    Banner {
        ad: String,
    },
    Video {
        #[serde(rename = "vastXml")]
        vast_xml: String,
    },
}

impl Creative {
    #[must_use]
    pub fn media_type(&self) -> MediaType {
        match self {
            Creative::Banner { .. } => MediaType::Banner,
            Creative::Video { .. } => MediaType::Video,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidMeta {
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertiser_domains: Option<Vec<String>>,
}

fn deserialize_loose_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(loose_number(&Json::deserialize(deserializer)?).unwrap_or(0.0))
}

fn deserialize_loose_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(deserialize_loose_opt_u32(deserializer)?.unwrap_or(0))
}

fn deserialize_loose_opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Json::deserialize(deserializer)?;
    Ok(loose_number(&value)
        .filter(|n| (0.0..=f64::from(u32::MAX)).contains(n))
        .map(|n| n.round() as u32))
}

/// Finite number from a JSON number or numeric string.
pub(crate) fn loose_number(value: &Json) -> Option<f64> {
    let parsed = match value {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Loose JSON truthiness as page scripts see it.
pub(crate) fn is_truthy(value: &Json) -> bool {
    match value {
        Json::Null => false,
        Json::Bool(b) => *b,
        Json::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Json::String(s) => !s.is_empty(),
        Json::Array(_) | Json::Object(_) => true,
    }
}
