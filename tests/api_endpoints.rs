//! Integration tests for ChainView HTTP endpoints
//!
//! The router is driven against an in-memory chain so the HTML page, the JSON
//! view and static files can be checked without a node.

use axum_test::TestServer;
use chainview::api::{build_router, AppState};
use chainview::explorer::Explorer;
use chainview::rpc::memory::synthetic_block;
use chainview::rpc::{MemoryChain, RpcReceipt, RpcTransaction};
use num_bigint::BigUint;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

fn transaction(hash: &str, to: Option<&str>, value: u64, gas_price: u64) -> RpcTransaction {
    RpcTransaction {
        hash: hash.to_string(),
        to: to.map(str::to_string),
        value: BigUint::from(value),
        gas_price: Some(BigUint::from(gas_price)),
        input: "0x".to_string(),
    }
}

fn receipt(hash: &str, gas_used: u64, contract: Option<&str>) -> RpcReceipt {
    RpcReceipt {
        transaction_hash: hash.to_string(),
        gas_used: BigUint::from(gas_used),
        contract_address: contract.map(str::to_string),
        effective_gas_price: None,
    }
}

fn sample_chain() -> MemoryChain {
    let mut block = synthetic_block(12);
    block.transactions = vec![
        transaction("0x01", Some("0xAAAA"), 1000, 20),
        transaction("0x02", None, 0, 30),
    ];
    MemoryChain::with_empty_blocks(12)
        .with_block(block)
        .with_receipt(receipt("0x01", 21000, None))
        .with_receipt(receipt("0x02", 53000, Some("0xBBBB")))
}

fn server_for(chain: MemoryChain, www: &TempDir) -> TestServer {
    let explorer = Explorer::new(Arc::new(chain));
    let app = build_router(AppState::new(explorer, www.path()));
    TestServer::new(app).expect("Failed to create test server")
}

#[tokio::test]
async fn test_index_page_lists_recent_blocks() {
    let www = TempDir::new().unwrap();
    let server = server_for(sample_chain(), &www);

    let response = server.get("/").await;
    assert_eq!(response.status_code(), 200);
    let html = response.text();
    assert!(html.contains("Latest block: 12"));
    assert!(html.contains("?blocknum=12"));
    assert!(html.contains("?blocknum=3"));
    assert!(!html.contains("?blocknum=2\""));
    assert!(!html.contains("Transactions in block"));

    let response = server.get("/index.html").await;
    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("Latest block: 12"));
}

#[tokio::test]
async fn test_index_page_with_selected_block() {
    let www = TempDir::new().unwrap();
    let server = server_for(sample_chain(), &www);

    let response = server.get("/").add_query_param("blocknum", "12").await;
    assert_eq!(response.status_code(), 200);
    let html = response.text();
    assert!(html.contains("Transactions in block 12"));
    assert!(html.contains("<td>420000</td>"));
    assert!(html.contains("<td>1590000</td>"));
    assert!(html.contains("contract creation"));
}

#[tokio::test]
async fn test_invalid_selection_is_ignored() {
    let www = TempDir::new().unwrap();
    let server = server_for(sample_chain(), &www);

    let response = server.get("/").add_query_param("blocknum", "twelve").await;
    assert_eq!(response.status_code(), 200);
    assert!(!response.text().contains("Transactions in block"));
}

#[tokio::test]
async fn test_chain_json() {
    let www = TempDir::new().unwrap();
    let server = server_for(sample_chain(), &www);

    let response = server.get("/api/chain").add_query_param("blocknum", "12").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();

    assert_eq!(json["last_block_number"], "12");
    assert_eq!(json["selected_block_number"], "12");
    assert_eq!(json["blocks"].as_array().unwrap().len(), 10);
    assert_eq!(json["blocks"][0]["number"], "12");
    assert_eq!(json["blocks"][9]["number"], "3");
    assert_eq!(json["transactions"][0]["fee_wei"], "420000");
    assert_eq!(json["transactions"][1]["fee_wei"], "1590000");
    assert_eq!(json["transactions"][1]["contract_address"], "0xBBBB");
    assert!(json["transactions"][1]["to_address"].is_null());
}

#[tokio::test]
async fn test_receipt_failure_keeps_block_list() {
    let www = TempDir::new().unwrap();
    let server = server_for(sample_chain().fail_receipt("0x02"), &www);

    let response = server.get("/api/chain").add_query_param("blocknum", "12").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();

    assert_eq!(json["blocks"].as_array().unwrap().len(), 10);
    assert!(json["transactions"].as_array().unwrap().is_empty());
    assert!(json["enrichment_error"].is_string());
}

#[tokio::test]
async fn test_unreachable_node() {
    let www = TempDir::new().unwrap();
    let server = server_for(MemoryChain::new(), &www);

    let response = server.get("/").expect_failure().await;
    assert_eq!(response.status_code(), 502);
    assert!(response.text().contains("Unable to retrieve blockchain info"));

    let response = server.get("/api/chain").expect_failure().await;
    assert_eq!(response.status_code(), 502);
    let json: Value = response.json();
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_health_and_stats() {
    let www = TempDir::new().unwrap();
    let server = server_for(sample_chain(), &www);

    let response = server.get("/api/health").await;
    assert_eq!(response.status_code(), 200);
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());

    server.get("/").await;

    let response = server.get("/api/stats").await;
    let json: Value = response.json();
    assert!(json["total_requests"].as_u64().unwrap() >= 2);
    assert_eq!(json["failed_requests"], 0);
    assert_eq!(json["window_size"], 10);
}

#[tokio::test]
async fn test_static_files_are_served() {
    let www = TempDir::new().unwrap();
    std::fs::write(www.path().join("style.css"), "body { color: black; }").unwrap();
    let server = server_for(sample_chain(), &www);

    let response = server.get("/style.css").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.text(), "body { color: black; }");

    let response = server.get("/missing.png").expect_failure().await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_other_html_files_are_served_verbatim() {
    let www = TempDir::new().unwrap();
    let page = "<p>{{ .LastBlockNumber }} {{ ShortHex .Hash }}</p>";
    std::fs::write(www.path().join("about.html"), page).unwrap();
    let server = server_for(sample_chain(), &www);

    let response = server.get("/about.html").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.text(), page);
}

#[tokio::test]
async fn test_signed_selection_is_accepted() {
    let www = TempDir::new().unwrap();
    let server = server_for(sample_chain(), &www);

    let response = server.get("/").add_query_param("blocknum", "+12").await;
    assert!(response.text().contains("Transactions in block 12"));

    let response = server.get("/").add_query_param("blocknum", " 12").await;
    assert!(!response.text().contains("Transactions in block"));
}
