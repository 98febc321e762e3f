// webrpc/src/methods/outputs.rs
use super::{decode_non_empty, internal_error, parse_addresses};
use crate::gateway::{Gatewayer, OutputsFilter};
use crate::protocol::Request;
use crate::RpcResult;
use ledger_core::ReadableOutputSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputsResult {
    pub outputs: ReadableOutputSet,
}

pub(crate) async fn get_unspent_outputs(
    req: Request,
    gateway: Arc<dyn Gatewayer>,
) -> RpcResult<OutputsResult> {
    let addrs: Vec<String> = decode_non_empty(&req)?;
    let addrs = parse_addresses(&addrs)?;

    let mut outputs = gateway
        .get_unspent_outputs(&[OutputsFilter::Addresses(addrs)])
        .await
        .map_err(|e| internal_error("get_unspent_outputs", e))?;
    outputs.sort_by_recency();

    Ok(OutputsResult { outputs })
}
