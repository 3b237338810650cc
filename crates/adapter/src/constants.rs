/// Currency floors are requested in, and the default bid currency.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Bid time-to-live in seconds when the vendor does not send one.
pub const DEFAULT_TTL_SECONDS: u32 = 400;

/// Version reported to the vendor in every request.
pub const ADAPTER_VERSION: &str = "6.0.0";

/// Wrapper family reported to the vendor.
pub const WRAPPER_TYPE: &str = "prebidjs";

/// Size wildcard used when querying floor providers.
pub const FLOOR_SIZE_WILDCARD: &str = "*";
