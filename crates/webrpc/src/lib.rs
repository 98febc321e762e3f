// webrpc/src/lib.rs

//! JSON-RPC 2.0 gateway over HTTP for a ledger node
//!
//! The server translates requests into calls on a [`Gatewayer`] and returns
//! readable projections of ledger state. [`Client`] is the typed counterpart.

pub mod client;
pub mod gateway;
pub mod methods;
pub mod protocol;
pub mod server;

pub use client::{Client, ClientError, ClientResult};
pub use gateway::{Gatewayer, OutputsFilter};
pub use methods::{AddrUxoutResult, OutputsResult, StatusResult, TxIdJson, TxnResult};
pub use protocol::{Outcome, Request, Response};
pub use server::{ServerConfig, WebRpc};

use serde::{Deserialize, Serialize};

/// Protocol version carried in every request and response
pub const JSONRPC_VERSION: &str = "2.0";

pub const ERR_CODE_PARSE_ERROR: i32 = -32700;
pub const ERR_CODE_INVALID_REQUEST: i32 = -32600;
pub const ERR_CODE_METHOD_NOT_FOUND: i32 = -32601;
pub const ERR_CODE_INVALID_PARAMS: i32 = -32602;
pub const ERR_CODE_INTERNAL_ERROR: i32 = -32603;

/// Standard JSON-RPC error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
}

impl ErrorCode {
    pub fn code(self) -> i32 {
        match self {
            ErrorCode::ParseError => ERR_CODE_PARSE_ERROR,
            ErrorCode::InvalidRequest => ERR_CODE_INVALID_REQUEST,
            ErrorCode::MethodNotFound => ERR_CODE_METHOD_NOT_FOUND,
            ErrorCode::InvalidParams => ERR_CODE_INVALID_PARAMS,
            ErrorCode::InternalError => ERR_CODE_INTERNAL_ERROR,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            ERR_CODE_PARSE_ERROR => Some(ErrorCode::ParseError),
            ERR_CODE_INVALID_REQUEST => Some(ErrorCode::InvalidRequest),
            ERR_CODE_METHOD_NOT_FOUND => Some(ErrorCode::MethodNotFound),
            ERR_CODE_INVALID_PARAMS => Some(ErrorCode::InvalidParams),
            ERR_CODE_INTERNAL_ERROR => Some(ErrorCode::InternalError),
            _ => None,
        }
    }

    /// Message used when a handler has nothing more specific to say
    pub fn default_message(self) -> &'static str {
        match self {
            ErrorCode::ParseError => "parse error",
            ErrorCode::InvalidRequest => "invalid request",
            ErrorCode::MethodNotFound => "method not found",
            ErrorCode::InvalidParams => "invalid params",
            ErrorCode::InternalError => "internal error",
        }
    }
}

/// The `error` member of a response
///
/// Displays as `"<message> [code: <code>]"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} [code: {code}]")]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    pub fn new(kind: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: kind.code(),
            message: message.into(),
        }
    }

    /// Error carrying the kind's default message
    pub fn from_kind(kind: ErrorCode) -> Self {
        Self::new(kind, kind.default_message())
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    /// `None` for codes outside the standard table
    pub fn kind(&self) -> Option<ErrorCode> {
        ErrorCode::from_code(self.code)
    }
}

pub type RpcResult<T> = Result<T, RpcError>;

/// Server lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("server already started")]
    AlreadyStarted,
    #[error("server is not running")]
    NotRunning,
    #[error("bind failed: {0}")]
    Bind(#[source] hyper::Error),
    #[error("server error: {0}")]
    Serve(#[source] hyper::Error),
    #[error("server task failed: {0}")]
    Task(String),
}

pub type ServerResult<T> = Result<T, ServerError>;
