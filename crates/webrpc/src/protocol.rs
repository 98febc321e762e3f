// webrpc/src/protocol.rs
use crate::{ErrorCode, RpcError, JSONRPC_VERSION};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_version() -> String {
    JSONRPC_VERSION.to_string()
}

/// A JSON-RPC request
///
/// A missing `jsonrpc` member is read as `"2.0"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Value,
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            id: id.into(),
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }

    /// Decode `params` into the method's expected shape
    ///
    /// Absent params decode as JSON `null`.
    pub fn decode_params<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(self.params.as_ref().unwrap_or(&Value::Null))
    }
}

/// Exactly one of `result` or `error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(RpcError),
}

/// A JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub id: Value,
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Response {
    pub fn success<T: Serialize>(id: Value, result: &T) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self::with_outcome(id, Outcome::Result(value)),
            Err(e) => {
                tracing::error!("encode result failed: {}", e);
                Self::error(id, RpcError::from_kind(ErrorCode::InternalError))
            }
        }
    }

    pub fn error(id: Value, error: RpcError) -> Self {
        Self::with_outcome(id, Outcome::Error(error))
    }

    pub fn from_result<T: Serialize>(id: Value, result: Result<T, RpcError>) -> Self {
        match result {
            Ok(value) => Self::success(id, &value),
            Err(error) => Self::error(id, error),
        }
    }

    fn with_outcome(id: Value, outcome: Outcome) -> Self {
        Self {
            id,
            jsonrpc: JSONRPC_VERSION.to_string(),
            outcome,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let req: Request = serde_json::from_str(r#"{"id":1,"method":"get_status"}"#).unwrap();
        assert_eq!(req.id, json!(1));
        assert_eq!(req.jsonrpc, "2.0");
        assert!(req.params.is_none());
    }

    #[test]
    fn test_decode_params() {
        let req = Request::new("1", "get_blocks", Some(json!([0, 1])));
        let params: Vec<u64> = req.decode_params().unwrap();
        assert_eq!(params, vec![0, 1]);

        let bad: Result<Vec<String>, _> = req.decode_params();
        assert!(bad.is_err());
    }

    #[test]
    fn test_missing_params_decode_as_null() {
        let req = Request::new("1", "get_status", None);
        let params: Option<Vec<u64>> = req.decode_params().unwrap();
        assert!(params.is_none());
        assert!(req.decode_params::<Vec<u64>>().is_err());
    }

    #[test]
    fn test_success_shape() {
        let resp = Response::success(json!("7"), &json!({"txid": "ab"}));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value, json!({"id": "7", "jsonrpc": "2.0", "result": {"txid": "ab"}}));
    }

    #[test]
    fn test_error_shape() {
        let resp = Response::error(json!("7"), RpcError::invalid_params("invalid params"));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["error"], json!({"code": -32602, "message": "invalid params"}));
        assert!(value.get("result").is_none());

        let parsed: Response = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, resp);
        assert!(parsed.is_error());
    }
}
