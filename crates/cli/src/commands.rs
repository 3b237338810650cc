//! Replay commands.
//!
//! Settings are loaded from TOML and merged with environment variables
//! prefixed with `SPOTIM_ADAPTER__`. Each command returns the rendered JSON
//! instead of printing it so callers decide where output goes.

use std::cell::RefCell;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use spotim_adapter::auction::{
    build_adapters, AuctionEnvironment, BidAdapter, BidRequest, BidderRequest, NormalizedBid,
    PixelTrigger, ServerResponse, UserSyncOptions,
};
use spotim_adapter::auction::types::VendorResponseBody;
use spotim_adapter::integrations::spotim::{SpotimAdapter, SpotimConfig, SPOTIM_ADAPTER_ID};
use spotim_adapter::settings::Settings;

use crate::error::CliError;

/// One adapter call as the host would make it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionFixture {
    pub bids: Vec<BidRequest>,
    #[serde(default)]
    pub bidder_request: BidderRequest,
    #[serde(default)]
    pub environment: AuctionEnvironment,
}

/// Load settings from `file`, or environment overrides alone when absent.
pub fn load_settings(file: Option<&Path>) -> Result<Settings, CliError> {
    let content = match file {
        Some(path) => {
            log::debug!("Loading settings from: {}", path.display());
            fs::read_to_string(path)?
        }
        None => String::new(),
    };

    Settings::from_toml(&content)
        .map_err(|e| CliError::Config(format!("Failed to parse and merge settings: {e:?}")))
}

/// Build the SpotIM adapter, using defaults when no table is configured.
fn spotim_adapter(settings: &Settings) -> Result<SpotimAdapter, CliError> {
    if !settings.adapters.contains_key(SPOTIM_ADAPTER_ID) {
        log::info!("No [adapters.{SPOTIM_ADAPTER_ID}] table, using defaults");
        return Ok(SpotimAdapter::new(SpotimConfig::default()));
    }

    match settings.adapter_config::<SpotimConfig>(SPOTIM_ADAPTER_ID) {
        Ok(Some(config)) => Ok(SpotimAdapter::new(config)),
        Ok(None) => Err(CliError::Config(format!(
            "adapters.{SPOTIM_ADAPTER_ID} is disabled"
        ))),
        Err(e) => Err(CliError::Config(format!("{e:?}"))),
    }
}

fn read_fixture<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| CliError::Fixture(format!("{}: {e}", path.display())))
}

/// One recorded transport response. `body` is required so that a bare vendor
/// body is reported instead of replayed as an empty response.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResponseFixture {
    body: VendorResponseBody,
}

/// Vendor responses may be given as one response or a list of them.
fn read_responses(path: &Path) -> Result<Vec<ServerResponse>, CliError> {
    let entries = match read_fixture::<serde_json::Value>(path)? {
        serde_json::Value::Array(entries) => entries,
        single => vec![single],
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value::<ResponseFixture>(entry)
                .map(|fixture| ServerResponse { body: fixture.body })
                .map_err(|e| {
                    CliError::Fixture(format!(
                        "{} response {index}: {e} (expected {{\"body\": {{...}}}})",
                        path.display()
                    ))
                })
        })
        .collect()
}

fn render(value: &serde_json::Value) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Fixture(format!("Failed to render output: {e}")))
}

/// Validate settings and list the adapters they register.
pub fn validate(file: &Path) -> Result<String, CliError> {
    let settings = load_settings(Some(file))?;

    // Surface the decode or validation error instead of the registry's log line.
    if settings.adapters.contains_key(SPOTIM_ADAPTER_ID) {
        settings
            .adapter_config::<SpotimConfig>(SPOTIM_ADAPTER_ID)
            .map_err(|e| CliError::Config(format!("{e:?}")))?;
    }

    let adapters: Vec<String> = build_adapters(&settings)
        .iter()
        .map(|adapter| adapter.bidder_code().to_string())
        .collect();

    render(&json!({ "valid": true, "adapters": adapters }))
}

/// Run `build_requests` for the auction fixture and render the descriptors.
pub fn build_request(settings_file: Option<&Path>, fixture: &Path) -> Result<String, CliError> {
    let adapter = spotim_adapter(&load_settings(settings_file)?)?;
    let fixture: AuctionFixture = read_fixture(fixture)?;

    let requests = adapter
        .build_requests(
            &fixture.bids,
            &fixture.bidder_request,
            &fixture.environment,
        )
        .map_err(|e| CliError::Fixture(format!("{e:?}")))?;

    let rendered: Vec<serde_json::Value> = requests
        .into_iter()
        .map(|request| {
            json!({
                "method": request.method.as_str(),
                "url": request.url,
                "data": request.data,
            })
        })
        .collect();

    render(&json!(rendered))
}

fn interpret_all(adapter: &SpotimAdapter, responses: &[ServerResponse]) -> Vec<NormalizedBid> {
    responses
        .iter()
        .flat_map(|response| adapter.interpret_response(response))
        .collect()
}

/// Interpret vendor responses into normalized bids.
pub fn interpret(settings_file: Option<&Path>, responses: &Path) -> Result<String, CliError> {
    let adapter = spotim_adapter(&load_settings(settings_file)?)?;
    let bids = interpret_all(&adapter, &read_responses(responses)?);

    let value = serde_json::to_value(&bids)
        .map_err(|e| CliError::Fixture(format!("Failed to render bids: {e}")))?;
    render(&value)
}

/// Collect user syncs the host would drop for these responses.
pub fn user_syncs(
    settings_file: Option<&Path>,
    responses: &Path,
    options: UserSyncOptions,
) -> Result<String, CliError> {
    let adapter = spotim_adapter(&load_settings(settings_file)?)?;
    let syncs = adapter.user_syncs(&options, &read_responses(responses)?);

    let value = serde_json::to_value(&syncs)
        .map_err(|e| CliError::Fixture(format!("Failed to render syncs: {e}")))?;
    render(&value)
}

/// Records win notifications instead of sending them.
#[derive(Default)]
struct CollectingPixels {
    urls: RefCell<Vec<String>>,
}

impl PixelTrigger for CollectingPixels {
    fn trigger_pixel(&self, url: &str) {
        self.urls.borrow_mut().push(url.to_string());
    }
}

/// Treat every interpreted bid as a winner and list the notifications fired.
pub fn win(settings_file: Option<&Path>, responses: &Path) -> Result<String, CliError> {
    let adapter = spotim_adapter(&load_settings(settings_file)?)?;
    let pixels = CollectingPixels::default();

    for bid in interpret_all(&adapter, &read_responses(responses)?) {
        adapter.on_bid_won(&bid, &pixels);
    }

    render(&json!(pixels.urls.into_inner()))
}
