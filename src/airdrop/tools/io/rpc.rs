use std::time::Duration;

use alloy_primitives::{Address, U256};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::airdrop::tools::amount::MAX_DECIMALS;
use crate::airdrop::tools::error::{Result, ToolError};
use crate::airdrop::tools::model::TokenInfo;

/// Selector of the ERC-20 `decimals()` function.
pub const DECIMALS_SELECTOR: &str = "0x313ce567";
/// Selector of the ERC-20 `symbol()` function.
pub const SYMBOL_SELECTOR: &str = "0x95d89b41";
/// Symbol reported when the `symbol()` call fails or cannot be decoded.
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";
/// Per-request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Executes read-only calls against a contract and returns the raw hex
/// result.
pub trait ContractCaller {
    fn call(&self, to: &Address, data: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: (CallRequest<'a>, &'static str),
    id: u64,
}

#[derive(Debug, Serialize)]
struct CallRequest<'a> {
    to: String,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// Blocking JSON-RPC client issuing `eth_call` against the latest block.
/// Every request is a single attempt bounded by the configured timeout.
pub struct RpcClient {
    url: String,
    http: Client,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(url, http))
    }

    /// Uses a preconfigured HTTP client, for example one with custom proxy
    /// settings.
    pub fn with_client(url: impl Into<String>, http: Client) -> Self {
        Self {
            url: url.into(),
            http,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ContractCaller for RpcClient {
    #[instrument(level = "debug", skip_all, fields(url = %self.url, %to, data = %data))]
    fn call(&self, to: &Address, data: &str) -> Result<String> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method: "eth_call",
            params: (
                CallRequest {
                    to: to.to_string(),
                    data,
                },
                "latest",
            ),
            id: 1,
        };

        let response: RpcResponse = self
            .http
            .post(&self.url)
            .json(&request)
            .send()?
            .error_for_status()?
            .json()?;

        if let Some(error) = response.error {
            return Err(ToolError::Rpc(error.to_string()));
        }
        match response.result {
            Some(Value::String(result)) => Ok(result),
            Some(other) => Err(ToolError::Rpc(format!("unexpected result {other}"))),
            None => Err(ToolError::Rpc("response carried no result".to_string())),
        }
    }
}

/// Picks the configured endpoint. An empty value counts as unset.
pub fn resolve_rpc_url(configured: Option<String>) -> Result<String> {
    configured
        .filter(|url| !url.trim().is_empty())
        .ok_or(ToolError::MissingRpcUrl)
}

/// Reads the token's `decimals()`. Any failure is fatal for the caller.
#[instrument(level = "info", skip_all, fields(%token))]
pub fn fetch_decimals<C: ContractCaller + ?Sized>(caller: &C, token: &Address) -> Result<u8> {
    let raw = caller.call(token, DECIMALS_SELECTOR)?;
    let value = decode_uint(&raw)?;
    if value > U256::from(MAX_DECIMALS) {
        return Err(ToolError::UnsupportedDecimals(value.to_string()));
    }
    let decimals = value.as_limbs()[0] as u8;
    debug!(decimals, "read token decimals");
    Ok(decimals)
}

/// Reads the token's `symbol()`, falling back to [`UNKNOWN_SYMBOL`].
#[instrument(level = "info", skip_all, fields(%token))]
pub fn fetch_symbol<C: ContractCaller + ?Sized>(caller: &C, token: &Address) -> String {
    match caller.call(token, SYMBOL_SELECTOR) {
        Ok(raw) => decode_string(&raw).unwrap_or_else(|| {
            warn!(payload = %raw, "could not decode token symbol");
            UNKNOWN_SYMBOL.to_string()
        }),
        Err(error) => {
            warn!(%error, "token symbol lookup failed");
            UNKNOWN_SYMBOL.to_string()
        }
    }
}

/// Reads decimals and symbol, in that order.
pub fn fetch_token_info<C: ContractCaller + ?Sized>(caller: &C, token: &Address) -> Result<TokenInfo> {
    let decimals = fetch_decimals(caller, token)?;
    let symbol = fetch_symbol(caller, token);
    Ok(TokenInfo { decimals, symbol })
}

/// Decodes a hex quantity such as `0x12`.
pub fn decode_uint(payload: &str) -> Result<U256> {
    let digits = strip_hex_prefix(payload);
    if digits.is_empty() {
        return Err(ToolError::InvalidHex {
            value: payload.to_string(),
            reason: "empty payload".to_string(),
        });
    }
    U256::from_str_radix(digits, 16).map_err(|error| ToolError::InvalidHex {
        value: payload.to_string(),
        reason: error.to_string(),
    })
}

/// Decodes an ABI-encoded dynamic `string` return value: an offset word, a
/// length word, then the UTF-8 bytes. NUL padding is stripped. Returns
/// `None` when the payload is too short or not valid hex or UTF-8.
pub fn decode_string(payload: &str) -> Option<String> {
    let digits = strip_hex_prefix(payload);
    if digits.len() < 128 || !digits.is_ascii() {
        return None;
    }

    let length = U256::from_str_radix(&digits[64..128], 16).ok()?;
    let available = digits.len() - 128;
    // A length running past the payload reads whatever is there.
    let chars = if length >= U256::from(available as u64) {
        available
    } else {
        (length.as_limbs()[0] as usize).saturating_mul(2).min(available)
    };

    let bytes = hex::decode(&digits[128..128 + chars]).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    Some(text.trim_matches('\0').to_string())
}

fn strip_hex_prefix(payload: &str) -> &str {
    payload
        .strip_prefix("0x")
        .or_else(|| payload.strip_prefix("0X"))
        .unwrap_or(payload)
}
