//! JSON-RPC 2.0 client for Ethereum-style nodes
//!
//! One [`NodeClient`] is built at startup and shared by every request. Two
//! transports are supported: HTTP(S), through a pooled `reqwest::Client` that is
//! safe to use from many tasks at once, and the node's local IPC socket, where
//! each call opens its own connection and exchanges one newline-terminated JSON
//! message in each direction.

#[cfg(unix)]
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use num_bigint::BigUint;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::types::{RpcBlock, RpcReceipt};
use super::ChainSource;
use crate::error::{ExplorerError, RpcError};
use crate::numeric::to_quantity;

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl RpcEnvelope {
    fn into_result<T: DeserializeOwned>(self) -> Result<Option<T>, RpcError> {
        if let Some(err) = self.error {
            return Err(RpcError::Node {
                code: err.code,
                message: err.message,
            });
        }

        match self.result {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }
}

enum Transport {
    Http { url: Url, client: Client },
    #[cfg(unix)]
    Ipc { path: PathBuf, timeout: Duration },
}

pub struct NodeClient {
    transport: Transport,
    next_id: AtomicU64,
}

impl NodeClient {
    /// Build a client for `endpoint`; every call is bounded by `timeout`.
    ///
    /// `http://` and `https://` URLs talk HTTP. A bare filesystem path, or an
    /// `ipc://` / `unix://` URL, talks to the node's IPC socket. WebSocket
    /// endpoints are rejected.
    pub fn connect(endpoint: &str, timeout: Duration) -> crate::error::Result<Self> {
        let transport = match Url::parse(endpoint) {
            Ok(url) => match url.scheme() {
                "http" | "https" => {
                    let client = Client::builder().timeout(timeout).build().map_err(|e| {
                        ExplorerError::Config(format!("unable to build HTTP client: {}", e))
                    })?;
                    Transport::Http { url, client }
                }
                "ipc" | "unix" => ipc_transport(PathBuf::from(url.path()), timeout)?,
                other => {
                    return Err(ExplorerError::Config(format!(
                        "unsupported node endpoint scheme {:?} (expected http, https or an IPC path)",
                        other
                    )))
                }
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                ipc_transport(PathBuf::from(endpoint), timeout)?
            }
            Err(e) => {
                return Err(ExplorerError::Config(format!(
                    "invalid node endpoint {:?}: {}",
                    endpoint, e
                )))
            }
        };

        let client = Self {
            transport,
            next_id: AtomicU64::new(1),
        };
        tracing::info!(
            endpoint = %client.describe(),
            timeout_ms = %timeout.as_millis(),
            "rpc.connect"
        );
        Ok(client)
    }

    /// Send one request. A `null` result comes back as `None`.
    pub async fn call_optional<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        tracing::debug!(method, id, "rpc.call");

        let envelope = match &self.transport {
            Transport::Http { url, client } => http_exchange(client, url, &request).await?,
            #[cfg(unix)]
            Transport::Ipc { path, timeout } => ipc_exchange(path, *timeout, &request).await?,
        };
        envelope.into_result()
    }

    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        self.call_optional(method, params)
            .await?
            .ok_or_else(|| RpcError::Decode(format!("{} returned no result", method)))
    }
}

#[cfg(unix)]
fn ipc_transport(path: PathBuf, timeout: Duration) -> crate::error::Result<Transport> {
    if path.as_os_str().is_empty() {
        return Err(ExplorerError::Config("IPC endpoint has an empty path".to_string()));
    }
    Ok(Transport::Ipc { path, timeout })
}

#[cfg(not(unix))]
fn ipc_transport(path: PathBuf, _timeout: Duration) -> crate::error::Result<Transport> {
    Err(ExplorerError::Config(format!(
        "IPC endpoint {} is not supported on this platform",
        path.display()
    )))
}

async fn http_exchange(client: &Client, url: &Url, request: &Value) -> Result<RpcEnvelope, RpcError> {
    let response = client.post(url.clone()).json(request).send().await?;

    let status = response.status();
    let body = response.text().await?;

    match serde_json::from_str(&body) {
        Ok(envelope) => Ok(envelope),
        Err(_) if !status.is_success() => Err(RpcError::Transport(format!("HTTP {} from node", status))),
        Err(e) => Err(RpcError::Decode(e.to_string())),
    }
}

#[cfg(unix)]
async fn ipc_exchange(path: &Path, timeout: Duration, request: &Value) -> Result<RpcEnvelope, RpcError> {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::UnixStream;

    let mut payload = serde_json::to_vec(request)?;
    payload.push(b'\n');

    let exchange = async {
        let mut stream = UnixStream::connect(path).await?;
        stream.write_all(&payload).await?;
        let mut line = String::new();
        BufReader::new(stream).read_line(&mut line).await?;
        Ok::<_, std::io::Error>(line)
    };

    let line = tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| {
            RpcError::Transport(format!(
                "no reply from {} within {}",
                path.display(),
                humantime::format_duration(timeout)
            ))
        })?
        .map_err(|e| RpcError::Transport(format!("{}: {}", path.display(), e)))?;

    if line.trim().is_empty() {
        return Err(RpcError::Transport(format!(
            "{} closed the connection without a reply",
            path.display()
        )));
    }
    Ok(serde_json::from_str(&line)?)
}

#[async_trait]
impl ChainSource for NodeClient {
    async fn block_number_raw(&self) -> Result<String, RpcError> {
        self.call("eth_blockNumber", json!([])).await
    }

    async fn block_by_number(&self, number: &BigUint) -> Result<RpcBlock, RpcError> {
        self.call_optional("eth_getBlockByNumber", json!([to_quantity(number), true]))
            .await?
            .ok_or_else(|| RpcError::NotFound(format!("block {}", number)))
    }

    async fn transaction_receipt(&self, hash: &str) -> Result<RpcReceipt, RpcError> {
        self.call_optional("eth_getTransactionReceipt", json!([hash]))
            .await?
            .ok_or_else(|| RpcError::NotFound(format!("receipt {}", hash)))
    }

    fn describe(&self) -> String {
        match &self.transport {
            Transport::Http { url, .. } => url.to_string(),
            #[cfg(unix)]
            Transport::Ipc { path, .. } => path.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_endpoint_schemes() {
        assert!(NodeClient::connect("ws://localhost:8546", TIMEOUT).is_err());
        assert!(NodeClient::connect("ftp://node.example.org", TIMEOUT).is_err());
        assert!(NodeClient::connect("https://mainnet.example.org", TIMEOUT).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_ipc_endpoints_are_accepted() {
        let bare = NodeClient::connect("/tmp/geth.ipc", TIMEOUT).unwrap();
        assert_eq!(bare.describe(), "/tmp/geth.ipc");

        let prefixed = NodeClient::connect("ipc:///var/run/geth.ipc", TIMEOUT).unwrap();
        assert_eq!(prefixed.describe(), "/var/run/geth.ipc");

        let relative = NodeClient::connect("data/geth.ipc", TIMEOUT).unwrap();
        assert_eq!(relative.describe(), "data/geth.ipc");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_block_number_over_ipc() {
        use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
        use tokio::net::UnixListener;

        let dir = tempfile::TempDir::new().unwrap();
        let socket = dir.path().join("node.ipc");
        let listener = UnixListener::bind(&socket).unwrap();

        let node = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read, mut write) = stream.into_split();
            let mut request = String::new();
            BufReader::new(read).read_line(&mut request).await.unwrap();
            write
                .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":\"0x2a\"}\n")
                .await
                .unwrap();
            request
        });

        let client = NodeClient::connect(socket.to_str().unwrap(), TIMEOUT).unwrap();
        let raw = client.block_number_raw().await.unwrap();
        assert_eq!(raw, "0x2a");

        let request: Value = serde_json::from_str(&node.await.unwrap()).unwrap();
        assert_eq!(request["method"], "eth_blockNumber");
        assert_eq!(request["jsonrpc"], "2.0");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ipc_socket_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let socket = dir.path().join("absent.ipc");

        let client = NodeClient::connect(socket.to_str().unwrap(), TIMEOUT).unwrap();
        let err = client.block_number_raw().await.unwrap_err();

        assert!(matches!(err, RpcError::Transport(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ipc_node_error_object() {
        use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
        use tokio::net::UnixListener;

        let dir = tempfile::TempDir::new().unwrap();
        let socket = dir.path().join("node.ipc");
        let listener = UnixListener::bind(&socket).unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read, mut write) = stream.into_split();
            let mut request = String::new();
            BufReader::new(read).read_line(&mut request).await.unwrap();
            write
                .write_all(
                    b"{\"jsonrpc\":\"2.0\",\"id\":1,\"error\":{\"code\":-32000,\"message\":\"syncing\"}}\n",
                )
                .await
                .unwrap();
        });

        let client = NodeClient::connect(socket.to_str().unwrap(), TIMEOUT).unwrap();
        let err = client.block_by_number(&BigUint::from(1u32)).await.unwrap_err();

        assert!(matches!(err, RpcError::Node { code: -32000, .. }));
    }

    #[tokio::test]
    async fn test_block_number() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "method": "eth_blockNumber" })))
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x2a"}"#)
            .create_async()
            .await;

        let client = NodeClient::connect(&server.url(), TIMEOUT).unwrap();
        let raw = client.block_number_raw().await.unwrap();

        assert_eq!(raw, "0x2a");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_block_request_uses_hex_quantity() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "eth_getBlockByNumber",
                "params": ["0xff", true]
            })))
            .with_body(
                r#"{"jsonrpc":"2.0","id":1,"result":{
                    "number":"0xff","hash":"0x01","miner":"0x02",
                    "timestamp":"0x10","transactions":[]}}"#,
            )
            .create_async()
            .await;

        let client = NodeClient::connect(&server.url(), TIMEOUT).unwrap();
        let block = client.block_by_number(&BigUint::from(255u32)).await.unwrap();

        assert_eq!(block.number, BigUint::from(255u32));
        assert!(block.transactions.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_null_block_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":null}"#)
            .create_async()
            .await;

        let client = NodeClient::connect(&server.url(), TIMEOUT).unwrap();
        let err = client.block_by_number(&BigUint::from(9u32)).await.unwrap_err();

        assert!(matches!(err, RpcError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_node_error_object() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_body(
                r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#,
            )
            .create_async()
            .await;

        let client = NodeClient::connect(&server.url(), TIMEOUT).unwrap();
        let err = client.transaction_receipt("0xabc").await.unwrap_err();

        match err {
            RpcError::Node { code, message } => {
                assert_eq!(code, -32601);
                assert_eq!(message, "method not found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_failure_without_json() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let client = NodeClient::connect(&server.url(), TIMEOUT).unwrap();
        let err = client.block_number_raw().await.unwrap_err();

        assert!(matches!(err, RpcError::Transport(_)));
    }
}
