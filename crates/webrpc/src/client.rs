// webrpc/src/client.rs
use crate::methods::{AddrUxoutResult, OutputsResult, StatusResult, TxIdJson, TxnResult};
use crate::protocol::{Outcome, Request, Response};
use crate::{ErrorCode, RpcError};
use hyper::client::HttpConnector;
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Method, StatusCode};
use ledger_core::{ReadableBlocks, Transaction};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with an error object
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error("http error: {0}")]
    Http(#[from] hyper::Error),
    #[error("invalid http request: {0}")]
    Request(#[from] hyper::http::Error),
    #[error("unexpected http status {0}")]
    Status(StatusCode),
    #[error("decode response failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response has neither result nor error")]
    MissingResult,
    #[error("response id {got} does not match request id {expected}")]
    IdMismatch { expected: String, got: Value },
}

impl ClientError {
    /// RPC error code, when the server returned one
    pub fn code(&self) -> Option<i32> {
        match self {
            ClientError::Rpc(e) => Some(e.code),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorCode> {
        match self {
            ClientError::Rpc(e) => e.kind(),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// JSON-RPC client for a node's RPC server
pub struct Client {
    addr: String,
    http: hyper::Client<HttpConnector>,
    next_id: AtomicU64,
}

impl Client {
    /// `addr` is `host:port`
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            http: hyper::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Send one request and decode its result into `T`
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> ClientResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        let request = Request::new(id.clone(), method, params);
        let body = serde_json::to_vec(&request)?;

        let http_req = hyper::Request::builder()
            .method(Method::POST)
            .uri(format!("http://{}/", self.addr))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))?;

        let http_resp = self.http.request(http_req).await?;
        if http_resp.status() != StatusCode::OK {
            return Err(ClientError::Status(http_resp.status()));
        }
        let bytes = hyper::body::to_bytes(http_resp.into_body()).await?;

        let value: Value = serde_json::from_slice(&bytes)?;
        if value.get("result").is_none() && value.get("error").is_none() {
            return Err(ClientError::MissingResult);
        }
        let response: Response = serde_json::from_value(value)?;

        match response.outcome {
            Outcome::Error(e) => Err(ClientError::Rpc(e)),
            Outcome::Result(result) => {
                if response.id != Value::String(id.clone()) {
                    return Err(ClientError::IdMismatch {
                        expected: id,
                        got: response.id,
                    });
                }
                Ok(serde_json::from_value(result)?)
            }
        }
    }

    pub async fn get_status(&self) -> ClientResult<StatusResult> {
        self.call("get_status", None).await
    }

    pub async fn get_transaction_by_id(&self, txid: &str) -> ClientResult<TxnResult> {
        self.call("get_transaction", Some(json!([txid]))).await
    }

    /// Inject a transaction; returns its txid
    pub async fn inject_transaction(&self, txn: &Transaction) -> ClientResult<String> {
        self.inject_transaction_str(&txn.to_hex()).await
    }

    /// Inject a hex-encoded raw transaction; returns its txid
    pub async fn inject_transaction_str(&self, raw_tx: &str) -> ClientResult<String> {
        let result: TxIdJson = self
            .call("inject_transaction", Some(json!([raw_tx])))
            .await?;
        Ok(result.txid)
    }

    pub async fn get_unspent_outputs(&self, addrs: &[String]) -> ClientResult<OutputsResult> {
        self.call("get_unspent_outputs", Some(json!(addrs))).await
    }

    pub async fn get_address_uxouts(
        &self,
        addrs: &[String],
    ) -> ClientResult<Vec<AddrUxoutResult>> {
        self.call("get_address_uxouts", Some(json!(addrs))).await
    }

    pub async fn get_blocks(&self, start: u64, end: u64) -> ClientResult<ReadableBlocks> {
        self.call("get_blocks", Some(json!([start, end]))).await
    }

    pub async fn get_blocks_by_seq(&self, seqs: &[u64]) -> ClientResult<ReadableBlocks> {
        self.call("get_blocks_by_seq", Some(json!(seqs))).await
    }

    pub async fn get_last_blocks(&self, n: u64) -> ClientResult<ReadableBlocks> {
        self.call("get_last_blocks", Some(json!([n]))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = ClientError::from(RpcError::invalid_params("invalid address: foo"));
        assert_eq!(err.code(), Some(-32602));
        assert_eq!(err.kind(), Some(ErrorCode::InvalidParams));
        assert_eq!(err.to_string(), "invalid address: foo [code: -32602]");
        assert_eq!(ClientError::MissingResult.code(), None);
    }

    #[test]
    fn test_ids_increase() {
        let client = Client::new("127.0.0.1:1");
        let a = client.next_id.fetch_add(1, Ordering::Relaxed);
        let b = client.next_id.fetch_add(1, Ordering::Relaxed);
        assert!(b > a);
        assert_eq!(client.addr(), "127.0.0.1:1");
    }
}
