// webrpc/src/methods/transaction.rs
use super::{decode_exact, internal_error};
use crate::gateway::Gatewayer;
use crate::protocol::Request;
use crate::{ErrorCode, RpcError, RpcResult};
use ledger_core::{Transaction, TransactionResult};
use ledger_crypto::Hash;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnResult {
    pub transaction: TransactionResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIdJson {
    pub txid: String,
}

pub(crate) async fn get_transaction(
    req: Request,
    gateway: Arc<dyn Gatewayer>,
) -> RpcResult<TxnResult> {
    let params: Vec<String> = decode_exact(&req, 1)?;

    let txid = Hash::from_hex(&params[0]).map_err(|e| {
        tracing::error!("decode txid failed: {}", e);
        RpcError::invalid_params("invalid transaction hash")
    })?;

    let txn = gateway
        .get_transaction(&txid)
        .await
        .map_err(|e| internal_error("get_transaction", e))?
        .ok_or_else(|| RpcError::new(ErrorCode::InvalidRequest, "transaction doesn't exist"))?;

    Ok(TxnResult {
        transaction: TransactionResult::new(&txn),
    })
}

pub(crate) async fn inject_transaction(
    req: Request,
    gateway: Arc<dyn Gatewayer>,
) -> RpcResult<TxIdJson> {
    let params: Vec<String> = decode_exact(&req, 1)?;

    let bytes = hex::decode(&params[0])
        .map_err(|e| RpcError::invalid_params(format!("invalid raw transaction: {}", e)))?;
    let txn =
        Transaction::deserialize(&bytes).map_err(|e| RpcError::invalid_params(e.to_string()))?;
    let txid = txn.hash();

    gateway.inject_transaction(txn).await.map_err(|e| {
        tracing::warn!(%txid, "inject transaction failed: {:#}", e);
        RpcError::new(
            ErrorCode::InternalError,
            format!("inject transaction failed: {}", e),
        )
    })?;

    tracing::info!(%txid, "transaction injected");
    Ok(TxIdJson {
        txid: txid.to_hex(),
    })
}
