// webrpc/src/methods/status.rs
use crate::gateway::Gatewayer;
use crate::protocol::Request;
use crate::{ErrorCode, RpcError, RpcResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Node liveness and chain head summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResult {
    pub running: bool,
    /// Number of blocks, i.e. head sequence plus one
    pub block_num: u64,
    pub last_block_hash: String,
    /// Seconds since the head block, e.g. `"12s"`
    pub time_since_last_block: String,
}

pub(crate) async fn get_status(
    req: Request,
    gateway: Arc<dyn Gatewayer>,
) -> RpcResult<StatusResult> {
    super::decode_none(&req)?;

    let blocks = gateway
        .get_last_blocks(1)
        .await
        .map_err(|e| super::internal_error("get_status", e))?;

    let last = blocks.blocks.last().ok_or_else(|| {
        tracing::error!("get_status: chain has no blocks");
        RpcError::from_kind(ErrorCode::InternalError)
    })?;

    let now = gateway.get_time_now();
    Ok(StatusResult {
        running: true,
        block_num: last.header.seq + 1,
        last_block_hash: last.header.block_hash.clone(),
        // A clock behind the head block wraps instead of failing
        time_since_last_block: format!("{}s", now.wrapping_sub(last.header.timestamp)),
    })
}
