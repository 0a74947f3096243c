//! Request and response envelopes.

use crate::error::{ProtocolError, ProtocolResult, RpcErrorObject};
use ciborium::Value;
use serde::{Deserialize, Serialize};

/// A call to a named remote method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Caller-chosen id echoed in the response.
    pub id: u64,
    /// Qualified method name, e.g. `leveldb_get`.
    pub method: String,
    /// Positional arguments.
    #[serde(default)]
    pub params: Vec<Value>,
}

impl RpcRequest {
    /// Creates a request.
    pub fn new(id: u64, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }

    /// Encodes to CBOR.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        encode(self)
    }

    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        decode(bytes)
    }
}

/// The outcome of a call: exactly one of `result` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Id of the request this answers.
    pub id: u64,
    /// Return value on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// Creates a successful response.
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Creates a failed response.
    pub fn failure(id: u64, error: RpcErrorObject) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Returns the result value or the error.
    pub fn into_result(self) -> Result<Value, RpcErrorObject> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }

    /// Encodes to CBOR.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        encode(self)
    }

    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        decode(bytes)
    }
}

fn encode<T: Serialize>(message: &T) -> ProtocolResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(message, &mut buf).map_err(|e| ProtocolError::Encode(e.to_string()))?;
    Ok(buf)
}

fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> ProtocolResult<T> {
    ciborium::from_reader(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes;
    use crate::params::IntoParam;

    #[test]
    fn request_round_trip() {
        let request = RpcRequest::new(
            7,
            "leveldb_ancientRange",
            vec![
                "headers".into_param(),
                95u64.into_param(),
                10u64.into_param(),
                1_000_000u64.into_param(),
            ],
        );
        let decoded = RpcRequest::decode(&request.encode().unwrap()).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn failure_response_carries_error() {
        let response = RpcResponse::failure(3, RpcErrorObject::method_not_found("leveldb_put"));
        let decoded = RpcResponse::decode(&response.encode().unwrap()).unwrap();
        assert!(decoded.result.is_none());
        let err = decoded.into_result().unwrap_err();
        assert_eq!(err.code, codes::METHOD_NOT_FOUND);
    }

    #[test]
    fn success_response_result() {
        let response = RpcResponse::success(1, true.into_param());
        assert_eq!(response.into_result().unwrap(), Value::Bool(true));
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(matches!(
            RpcRequest::decode(&[0xff, 0x00, 0x13]),
            Err(ProtocolError::Decode(_))
        ));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn param_strategy() -> impl Strategy<Value = Value> {
            prop_oneof![
                prop::collection::vec(any::<u8>(), 0..32).prop_map(IntoParam::into_param),
                "[a-zA-Z]{0,12}".prop_map(IntoParam::into_param),
                any::<u64>().prop_map(IntoParam::into_param),
                any::<bool>().prop_map(IntoParam::into_param),
            ]
        }

        proptest! {
            #[test]
            fn requests_survive_encoding(
                id in any::<u64>(),
                method in "leveldb_[a-zA-Z]{1,12}",
                params in prop::collection::vec(param_strategy(), 0..5),
            ) {
                let request = RpcRequest::new(id, method, params);
                let decoded = RpcRequest::decode(&request.encode().unwrap()).unwrap();
                prop_assert_eq!(decoded, request);
            }

            #[test]
            fn responses_survive_encoding(
                id in any::<u64>(),
                result in param_strategy(),
                code in -32800i64..-32000,
                message in "[ -~]{0,40}",
                failed in any::<bool>(),
            ) {
                let response = if failed {
                    RpcResponse::failure(id, RpcErrorObject::new(code, message))
                } else {
                    RpcResponse::success(id, result)
                };
                let decoded = RpcResponse::decode(&response.encode().unwrap()).unwrap();
                prop_assert_eq!(decoded, response);
            }

            #[test]
            fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
                let _ = RpcRequest::decode(&bytes);
                let _ = RpcResponse::decode(&bytes);
            }
        }
    }
}
