use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use airdrop_tools::io::rpc::{
    self, ContractCaller, DECIMALS_SELECTOR, RpcClient, SYMBOL_SELECTOR, UNKNOWN_SYMBOL,
};
use airdrop_tools::{Result, ToolError};
use alloy_primitives::{Address, U256};
use serde_json::{Value, json};

const TOKEN: &str = "0x639E387DE0fF0E68a42b5Ae77b86dA8F0e15623c";

fn token() -> Address {
    TOKEN.parse().expect("token address")
}

/// ABI encoding of a `string` return value.
fn abi_string(value: &str) -> String {
    let mut data = hex::encode(value.as_bytes());
    let padded = data.len().div_ceil(64).max(1) * 64;
    data.push_str(&"0".repeat(padded - data.len()));
    format!("0x{:064x}{:064x}{data}", 32, value.len())
}

/// Answers each selector with a canned result, or an RPC error when absent.
struct FakeCaller {
    results: HashMap<&'static str, String>,
}

impl FakeCaller {
    fn new(results: &[(&'static str, String)]) -> Self {
        Self {
            results: results.iter().cloned().collect(),
        }
    }
}

impl ContractCaller for FakeCaller {
    fn call(&self, _to: &Address, data: &str) -> Result<String> {
        self.results
            .get(data)
            .cloned()
            .ok_or_else(|| ToolError::Rpc("execution reverted".to_string()))
    }
}

#[test]
fn decode_uint_reads_hex_quantities() {
    assert_eq!(rpc::decode_uint("0x12").expect("decoded"), U256::from(18u64));
    assert_eq!(
        rpc::decode_uint(&format!("0x{:064x}", 6)).expect("decoded"),
        U256::from(6u64)
    );
    assert!(matches!(rpc::decode_uint("0x"), Err(ToolError::InvalidHex { .. })));
    assert!(matches!(rpc::decode_uint("0xzz"), Err(ToolError::InvalidHex { .. })));
}

#[test]
fn decode_string_reads_abi_strings() {
    assert_eq!(rpc::decode_string(&abi_string("EIGEN")).as_deref(), Some("EIGEN"));
    assert_eq!(rpc::decode_string(&abi_string("")).as_deref(), Some(""));
}

#[test]
fn decode_string_strips_nul_padding() {
    // Length word claims the whole padded word.
    let payload = format!("0x{:064x}{:064x}{:0<64}", 32, 32, hex::encode("USDC"));
    assert_eq!(rpc::decode_string(&payload).as_deref(), Some("USDC"));
}

#[test]
fn decode_string_rejects_short_or_invalid_payloads() {
    assert_eq!(rpc::decode_string("0x"), None);
    assert_eq!(rpc::decode_string(&format!("0x{:064x}", 32)), None);

    let invalid_utf8 = format!("0x{:064x}{:064x}{:0<64}", 32, 2, "fffe");
    assert_eq!(rpc::decode_string(&invalid_utf8), None);
}

#[test]
fn token_info_uses_both_calls() {
    let caller = FakeCaller::new(&[
        (DECIMALS_SELECTOR, format!("0x{:064x}", 18)),
        (SYMBOL_SELECTOR, abi_string("EIGEN")),
    ]);

    let info = rpc::fetch_token_info(&caller, &token()).expect("token info");
    assert_eq!(info.decimals, 18);
    assert_eq!(info.symbol, "EIGEN");
}

#[test]
fn symbol_failure_falls_back_to_unknown() {
    let caller = FakeCaller::new(&[(DECIMALS_SELECTOR, "0x6".to_string())]);

    let info = rpc::fetch_token_info(&caller, &token()).expect("token info");
    assert_eq!(info.decimals, 6);
    assert_eq!(info.symbol, UNKNOWN_SYMBOL);

    let caller = FakeCaller::new(&[(SYMBOL_SELECTOR, "0x".to_string())]);
    assert_eq!(rpc::fetch_symbol(&caller, &token()), UNKNOWN_SYMBOL);
}

#[test]
fn decimals_failure_is_fatal() {
    let caller = FakeCaller::new(&[(SYMBOL_SELECTOR, abi_string("EIGEN"))]);
    assert!(matches!(
        rpc::fetch_token_info(&caller, &token()),
        Err(ToolError::Rpc(_))
    ));

    let caller = FakeCaller::new(&[(DECIMALS_SELECTOR, "0x".to_string())]);
    assert!(matches!(
        rpc::fetch_decimals(&caller, &token()),
        Err(ToolError::InvalidHex { .. })
    ));
}

#[test]
fn oversized_decimals_are_rejected() {
    let caller = FakeCaller::new(&[(DECIMALS_SELECTOR, format!("0x{:x}", 78))]);
    assert!(matches!(
        rpc::fetch_decimals(&caller, &token()),
        Err(ToolError::UnsupportedDecimals(_))
    ));
}

fn loopback_client(url: String) -> RpcClient {
    let http = reqwest::blocking::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("HTTP client built");
    RpcClient::with_client(url, http)
}

/// Serves one canned JSON-RPC reply per connection and hands back the
/// request bodies it received.
fn serve(replies: Vec<(u16, Value)>) -> (String, thread::JoinHandle<Vec<Value>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("loopback listener");
    let url = format!("http://{}", listener.local_addr().expect("local address"));

    let handle = thread::spawn(move || {
        let mut requests: Vec<Value> = Vec::new();
        for (status, reply) in replies {
            let (stream, _) = listener.accept().expect("connection accepted");
            let mut reader = BufReader::new(stream);

            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).expect("header line");
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().expect("content length");
                    }
                }
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).expect("request body");
            requests.push(serde_json::from_slice(&body).expect("JSON request"));

            let payload = reply.to_string();
            let response = format!(
                "HTTP/1.1 {status} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
                payload.len()
            );
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).expect("response written");
            stream.flush().expect("response flushed");
        }
        requests
    });

    (url, handle)
}

#[test]
fn client_posts_eth_call_requests() {
    let (url, server) = serve(vec![
        (200, json!({"jsonrpc": "2.0", "id": 1, "result": format!("0x{:064x}", 18)})),
        (200, json!({"jsonrpc": "2.0", "id": 1, "result": abi_string("EIGEN")})),
    ]);
    let url_copy = url.clone();
    let client = loopback_client(url);

    let info = rpc::fetch_token_info(&client, &token()).expect("token info");
    assert_eq!(info.decimals, 18);
    assert_eq!(info.symbol, "EIGEN");
    assert_eq!(client.url(), url_copy);

    let requests = server.join().expect("server finished");
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0]["jsonrpc"], "2.0");
    assert_eq!(requests[0]["method"], "eth_call");
    assert_eq!(requests[0]["id"], 1);
    assert_eq!(requests[0]["params"][1], "latest");
    assert_eq!(
        requests[0]["params"][0]["to"]
            .as_str()
            .expect("to address")
            .to_lowercase(),
        TOKEN.to_lowercase()
    );
    assert_eq!(requests[0]["params"][0]["data"], DECIMALS_SELECTOR);
    assert_eq!(requests[1]["params"][0]["data"], SYMBOL_SELECTOR);
}

#[test]
fn client_surfaces_rpc_errors() {
    let (url, server) = serve(vec![(
        200,
        json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": "execution reverted"}}),
    )]);
    let client = loopback_client(url);

    let error = client
        .call(&token(), DECIMALS_SELECTOR)
        .expect_err("RPC error");
    match error {
        ToolError::Rpc(message) => assert!(message.contains("execution reverted")),
        other => panic!("unexpected error: {other}"),
    }
    server.join().expect("server finished");
}

#[test]
fn client_treats_http_failures_as_errors() {
    let (url, server) = serve(vec![(500, json!({"message": "internal"}))]);
    let client = loopback_client(url);

    assert!(matches!(
        client.call(&token(), DECIMALS_SELECTOR),
        Err(ToolError::Http(_))
    ));
    server.join().expect("server finished");
}

#[test]
fn client_builds_with_timeout() {
    let client = RpcClient::new("http://127.0.0.1:8545", rpc::DEFAULT_TIMEOUT).expect("client built");
    assert_eq!(client.url(), "http://127.0.0.1:8545");
}

#[test]
fn empty_rpc_url_counts_as_missing() {
    assert!(matches!(
        rpc::resolve_rpc_url(Some(String::new())),
        Err(ToolError::MissingRpcUrl)
    ));
    assert!(matches!(
        rpc::resolve_rpc_url(Some("  ".to_string())),
        Err(ToolError::MissingRpcUrl)
    ));
    assert!(matches!(rpc::resolve_rpc_url(None), Err(ToolError::MissingRpcUrl)));

    let error = rpc::resolve_rpc_url(Some(String::new())).expect_err("empty url rejected");
    assert_eq!(error.to_string(), "RPC_URL environment variable is required");
}

#[test]
fn configured_rpc_url_is_used() {
    let url = rpc::resolve_rpc_url(Some("http://127.0.0.1:8545".to_string())).expect("url kept");
    assert_eq!(url, "http://127.0.0.1:8545");
}
