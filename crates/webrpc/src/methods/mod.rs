// webrpc/src/methods/mod.rs

//! Method handlers and the name-to-handler table
//!
//! Every handler follows the same discipline: decode params (arity
//! included) into the method's shape, validate domain values, call the
//! gateway, then wrap the readable result under the method's field name.
//! Gateway failures are logged and reported as a generic internal error.

mod blocks;
mod outputs;
mod status;
mod transaction;
mod uxouts;

pub use outputs::OutputsResult;
pub use status::StatusResult;
pub use transaction::{TxIdJson, TxnResult};
pub use uxouts::AddrUxoutResult;

use crate::gateway::Gatewayer;
use crate::protocol::{Request, Response};
use crate::{ErrorCode, RpcError, RpcResult};
use futures::future::BoxFuture;
use ledger_crypto::Address;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A method handler: request in, response out
pub type Handler = fn(Request, Arc<dyn Gatewayer>) -> BoxFuture<'static, Response>;

/// Wrap `async fn(Request, Arc<dyn Gatewayer>) -> RpcResult<T>` as a [`Handler`]
macro_rules! handler {
    ($f:path) => {{
        fn handle(req: Request, gateway: Arc<dyn Gatewayer>) -> BoxFuture<'static, Response> {
            Box::pin(async move {
                let id = req.id.clone();
                Response::from_result(id, $f(req, gateway).await)
            })
        }
        handle as Handler
    }};
}

/// Build the method table
pub fn handlers() -> HashMap<&'static str, Handler> {
    let mut table: HashMap<&'static str, Handler> = HashMap::new();
    table.insert("get_status", handler!(status::get_status));
    table.insert("get_transaction", handler!(transaction::get_transaction));
    table.insert("inject_transaction", handler!(transaction::inject_transaction));
    table.insert("get_unspent_outputs", handler!(outputs::get_unspent_outputs));
    table.insert("get_address_uxouts", handler!(uxouts::get_address_uxouts));
    table.insert("get_blocks", handler!(blocks::get_blocks));
    table.insert("get_blocks_by_seq", handler!(blocks::get_blocks_by_seq));
    table.insert("get_last_blocks", handler!(blocks::get_last_blocks));
    table
}

/// Decode params, mapping any failure to the generic invalid params error
pub(crate) fn decode_params<T: DeserializeOwned>(req: &Request) -> RpcResult<T> {
    req.decode_params().map_err(|e| {
        tracing::error!(method = %req.method, "decode params failed: {}", e);
        RpcError::from_kind(ErrorCode::InvalidParams)
    })
}

/// Accept absent, `null` or `[]` params; anything else is invalid
pub(crate) fn decode_none(req: &Request) -> RpcResult<()> {
    match &req.params {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Array(items)) if items.is_empty() => Ok(()),
        Some(_) => {
            tracing::debug!(method = %req.method, "unexpected params");
            Err(RpcError::from_kind(ErrorCode::InvalidParams))
        }
    }
}

/// Decode a params array of exactly `arity` elements
pub(crate) fn decode_exact<T: DeserializeOwned>(req: &Request, arity: usize) -> RpcResult<Vec<T>> {
    let params: Vec<T> = decode_params(req)?;
    if params.len() != arity {
        return Err(RpcError::from_kind(ErrorCode::InvalidParams));
    }
    Ok(params)
}

/// Decode a params array with at least one element
pub(crate) fn decode_non_empty<T: DeserializeOwned>(req: &Request) -> RpcResult<Vec<T>> {
    let params: Vec<T> = decode_params(req)?;
    if params.is_empty() {
        return Err(RpcError::from_kind(ErrorCode::InvalidParams));
    }
    Ok(params)
}

/// Parse every address; the first bad one fails the whole call
pub(crate) fn parse_addresses(addrs: &[String]) -> RpcResult<Vec<Address>> {
    addrs
        .iter()
        .map(|s| {
            s.parse::<Address>()
                .map_err(|_| RpcError::invalid_params(format!("invalid address: {}", s)))
        })
        .collect()
}

/// Log a gateway failure and hide it behind the generic internal error
pub(crate) fn internal_error(method: &str, err: anyhow::Error) -> RpcError {
    tracing::error!(method = %method, "gateway call failed: {:#}", err);
    RpcError::from_kind(ErrorCode::InternalError)
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_has_every_method() {
        let table = handlers();
        for name in [
            "get_status",
            "get_transaction",
            "inject_transaction",
            "get_unspent_outputs",
            "get_address_uxouts",
            "get_blocks",
            "get_blocks_by_seq",
            "get_last_blocks",
        ] {
            assert!(table.contains_key(name), "missing {}", name);
        }
        assert_eq!(table.len(), 8);
    }

    #[test]
    fn test_decode_exact_arity() {
        let req = Request::new("1", "get_blocks", Some(json!([1, 2, 3])));
        let err = decode_exact::<u64>(&req, 2).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorCode::InvalidParams));
        assert_eq!(err.message, "invalid params");
        assert_eq!(decode_exact::<u64>(&req, 3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_non_empty() {
        let req = Request::new("1", "get_blocks_by_seq", Some(json!([])));
        assert!(decode_non_empty::<u64>(&req).is_err());
        let req = Request::new("1", "get_blocks_by_seq", None);
        assert!(decode_non_empty::<u64>(&req).is_err());
    }

    #[test]
    fn test_parse_addresses_reports_first_bad() {
        let good = ledger_crypto::KeyPair::generate().address().to_string();
        let addrs = vec![good, "bad-one".to_string(), "bad-two".to_string()];
        let err = parse_addresses(&addrs).unwrap_err();
        assert_eq!(err.to_string(), "invalid address: bad-one [code: -32602]");
    }
}
