// webrpc/src/methods/uxouts.rs
use super::{decode_non_empty, internal_error, parse_addresses};
use crate::gateway::Gatewayer;
use crate::protocol::Request;
use crate::RpcResult;
use ledger_core::UxOutJson;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// History of one requested address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddrUxoutResult {
    pub address: String,
    pub uxouts: Vec<UxOutJson>,
}

pub(crate) async fn get_address_uxouts(
    req: Request,
    gateway: Arc<dyn Gatewayer>,
) -> RpcResult<Vec<AddrUxoutResult>> {
    let addrs: Vec<String> = decode_non_empty(&req)?;
    let addrs = parse_addresses(&addrs)?;

    let mut results = Vec::with_capacity(addrs.len());
    for address in addrs {
        let uxouts = gateway
            .get_addr_uxouts(&address)
            .await
            .map_err(|e| internal_error("get_address_uxouts", e))?;
        results.push(AddrUxoutResult {
            address: address.to_string(),
            uxouts,
        });
    }
    Ok(results)
}
