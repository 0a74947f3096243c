//! Protocol errors and wire error codes.

use ancientkv_core::DbError;
use ciborium::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while encoding or decoding messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A message could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// A message could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Call arguments have the wrong count or type.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// A frame exceeds [`crate::MAX_FRAME_LEN`].
    #[error("frame of {0} bytes exceeds the maximum")]
    FrameTooLarge(usize),
}

/// Wire error codes.
pub mod codes {
    /// The message could not be parsed.
    pub const PARSE_ERROR: i64 = -32700;
    /// The method is not registered.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Wrong argument count or types.
    pub const INVALID_PARAMS: i64 = -32602;
    /// The server failed to handle the call.
    pub const INTERNAL_ERROR: i64 = -32603;
    /// Key or ancient item absent.
    pub const NOT_FOUND: i64 = -32000;
    /// Ancient index before the retained tail.
    pub const OUT_OF_RANGE: i64 = -32001;
    /// Unknown ancient table.
    pub const UNKNOWN_TABLE: i64 = -32002;
    /// Write rejected by the backend.
    pub const WRITE_NOT_ALLOWED: i64 = -32003;
    /// Operation rejected as unsupported.
    pub const NOT_SUPPORTED: i64 = -32004;
    /// Storage engine failure.
    pub const ENGINE_ERROR: i64 = -32010;
}

/// The error member of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    /// Error code, see [`codes`].
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Structured detail needed to rebuild the error on the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcErrorObject {
    /// Creates an error without detail.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attaches structured detail.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Error for an unregistered method.
    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            codes::METHOD_NOT_FOUND,
            format!("the method {method} does not exist/is not available"),
        )
    }

    /// Error for bad arguments.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(codes::INVALID_PARAMS, message)
    }

    /// Error for an unparseable message.
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(codes::PARSE_ERROR, message)
    }

    /// Error for a server-side failure.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL_ERROR, message)
    }

    /// Rebuilds the contract error the server reported.
    ///
    /// Errors without a contract counterpart (parse, method, params and
    /// internal errors) become [`DbError::Protocol`].
    pub fn into_db_error(self) -> DbError {
        match self.code {
            codes::NOT_FOUND => DbError::NotFound,
            codes::WRITE_NOT_ALLOWED => DbError::WriteNotAllowed,
            codes::NOT_SUPPORTED => DbError::NotSupported,
            codes::ENGINE_ERROR => DbError::Engine(self.message),
            codes::UNKNOWN_TABLE => match self.data {
                Some(Value::Text(kind)) => DbError::UnknownTable(kind),
                _ => DbError::Protocol(self.message),
            },
            codes::OUT_OF_RANGE => match out_of_range_detail(self.data.as_ref()) {
                Some((kind, index, tail)) => DbError::OutOfRange { kind, index, tail },
                None => DbError::Protocol(self.message),
            },
            code => DbError::Protocol(format!("{} (code {code})", self.message)),
        }
    }
}

fn out_of_range_detail(data: Option<&Value>) -> Option<(String, u64, u64)> {
    match data? {
        Value::Array(items) => match items.as_slice() {
            [Value::Text(kind), Value::Integer(index), Value::Integer(tail)] => Some((
                kind.clone(),
                u64::try_from(*index).ok()?,
                u64::try_from(*tail).ok()?,
            )),
            _ => None,
        },
        _ => None,
    }
}

impl From<&DbError> for RpcErrorObject {
    fn from(err: &DbError) -> Self {
        let message = err.to_string();
        match err {
            DbError::NotFound => Self::new(codes::NOT_FOUND, message),
            DbError::WriteNotAllowed => Self::new(codes::WRITE_NOT_ALLOWED, message),
            DbError::NotSupported => Self::new(codes::NOT_SUPPORTED, message),
            DbError::UnknownTable(kind) => {
                Self::new(codes::UNKNOWN_TABLE, message).with_data(Value::Text(kind.clone()))
            }
            DbError::OutOfRange { kind, index, tail } => Self::new(codes::OUT_OF_RANGE, message)
                .with_data(Value::Array(vec![
                    Value::Text(kind.clone()),
                    Value::Integer((*index).into()),
                    Value::Integer((*tail).into()),
                ])),
            DbError::Engine(detail) => Self::new(codes::ENGINE_ERROR, detail.clone()),
            DbError::Transport(_) | DbError::Protocol(_) => Self::internal(message),
        }
    }
}

impl From<ProtocolError> for RpcErrorObject {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidParams(message) => Self::invalid_params(message),
            ProtocolError::Decode(message) => Self::parse_error(message),
            other => Self::internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn through_wire(err: DbError) -> DbError {
        RpcErrorObject::from(&err).into_db_error()
    }

    #[test]
    fn contract_errors_survive_the_wire() {
        assert!(matches!(through_wire(DbError::NotFound), DbError::NotFound));
        assert!(matches!(
            through_wire(DbError::WriteNotAllowed),
            DbError::WriteNotAllowed
        ));
        assert!(matches!(
            through_wire(DbError::UnknownTable("bodies".into())),
            DbError::UnknownTable(kind) if kind == "bodies"
        ));
        assert!(matches!(
            through_wire(DbError::OutOfRange { kind: "headers".into(), index: 2, tail: 5 }),
            DbError::OutOfRange { index: 2, tail: 5, .. }
        ));
        assert!(matches!(
            through_wire(DbError::Engine("disk on fire".into())),
            DbError::Engine(msg) if msg == "disk on fire"
        ));
    }

    #[test]
    fn rpc_errors_become_protocol_errors() {
        let err = RpcErrorObject::method_not_found("leveldb_put").into_db_error();
        match err {
            DbError::Protocol(msg) => {
                assert!(msg.contains("leveldb_put"));
                assert!(msg.contains("-32601"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn malformed_detail_is_a_protocol_error() {
        let err = RpcErrorObject::new(codes::OUT_OF_RANGE, "bad").into_db_error();
        assert!(matches!(err, DbError::Protocol(_)));
    }
}
