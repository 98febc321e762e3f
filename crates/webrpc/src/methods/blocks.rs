// webrpc/src/methods/blocks.rs

//! Block queries; ordering is whatever the gateway returns

use super::{decode_exact, decode_non_empty, internal_error};
use crate::gateway::Gatewayer;
use crate::protocol::Request;
use crate::RpcResult;
use ledger_core::ReadableBlocks;
use std::sync::Arc;

pub(crate) async fn get_blocks(
    req: Request,
    gateway: Arc<dyn Gatewayer>,
) -> RpcResult<ReadableBlocks> {
    let range: Vec<u64> = decode_exact(&req, 2)?;
    gateway
        .get_blocks(range[0], range[1])
        .await
        .map_err(|e| internal_error("get_blocks", e))
}

pub(crate) async fn get_blocks_by_seq(
    req: Request,
    gateway: Arc<dyn Gatewayer>,
) -> RpcResult<ReadableBlocks> {
    let seqs: Vec<u64> = decode_non_empty(&req)?;
    gateway
        .get_blocks_in_depth(&seqs)
        .await
        .map_err(|e| internal_error("get_blocks_by_seq", e))
}

pub(crate) async fn get_last_blocks(
    req: Request,
    gateway: Arc<dyn Gatewayer>,
) -> RpcResult<ReadableBlocks> {
    let n: Vec<u64> = decode_exact(&req, 1)?;
    gateway
        .get_last_blocks(n[0])
        .await
        .map_err(|e| internal_error("get_last_blocks", e))
}
