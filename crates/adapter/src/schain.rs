//! Compact supply-chain encoding.
//!
//! The vendor takes the `SupplyChain` object as one string:
//! `ver,complete` followed by `!asi,sid,hp,rid,name,domain` per node.

use serde::Deserialize;
use serde_json::Value as Json;

use crate::auction::types::is_truthy;

#[derive(Debug, Deserialize)]
struct SupplyChain {
    ver: Json,
    complete: Json,
    #[serde(default)]
    nodes: Vec<SupplyChainNode>,
}

#[derive(Debug, Default, Deserialize)]
struct SupplyChainNode {
    #[serde(default)]
    asi: Json,
    #[serde(default)]
    sid: Json,
    #[serde(default)]
    hp: Json,
    #[serde(default)]
    rid: Json,
    #[serde(default)]
    name: Json,
    #[serde(default)]
    domain: Json,
}

/// Encode a supply-chain object.
///
/// Empty or malformed objects encode to an empty string.
#[must_use]
pub fn encode_supply_chain(schain: &Json) -> String {
    if schain.as_object().is_none_or(serde_json::Map::is_empty) {
        return String::new();
    }

    let chain = match SupplyChain::deserialize(schain) {
        Ok(chain) => chain,
        Err(e) => {
            log::warn!("Ignoring malformed schain: {e}");
            return String::new();
        }
    };

    let (Some(ver), Some(complete)) = (scalar(&chain.ver), scalar(&chain.complete)) else {
        log::warn!("Ignoring schain without ver/complete");
        return String::new();
    };

    let mut encoded = format!("{ver},{complete}");
    for node in &chain.nodes {
        let hp = if is_truthy(&node.hp) {
            scalar(&node.hp).map(|v| encode_uri_component(&v)).unwrap_or_default()
        } else {
            String::new()
        };

        encoded.push('!');
        encoded.push_str(
            &[
                encoded_if_not_empty(&node.asi),
                encoded_if_not_empty(&node.sid),
                hp,
                encoded_if_not_empty(&node.rid),
                encoded_if_not_empty(&node.name),
                encoded_if_not_empty(&node.domain),
            ]
            .join(","),
        );
    }

    encoded
}

/// Non-empty strings are percent-encoded; everything else becomes empty.
fn encoded_if_not_empty(value: &Json) -> String {
    match value {
        Json::String(s) if !s.is_empty() => encode_uri_component(s),
        _ => String::new(),
    }
}

fn scalar(value: &Json) -> Option<String> {
    match value {
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        Json::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Percent-encode with the same unreserved set as `encodeURIComponent`.
pub(crate) fn encode_uri_component(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}
