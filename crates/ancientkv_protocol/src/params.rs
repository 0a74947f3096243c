//! Positional argument and result marshalling.
//!
//! Arguments and results travel as CBOR values: byte strings for keys,
//! values and items, text for table kinds and properties, unsigned
//! integers for indices and counts.

use crate::error::{ProtocolError, ProtocolResult};
use ciborium::Value;

/// Conversion into a wire value.
pub trait IntoParam {
    /// Converts `self` into a wire value.
    fn into_param(self) -> Value;
}

/// Conversion from a wire value.
pub trait FromParam: Sized {
    /// Converts a wire value, failing on a type mismatch.
    fn from_param(value: &Value) -> ProtocolResult<Self>;
}

impl IntoParam for &[u8] {
    fn into_param(self) -> Value {
        Value::Bytes(self.to_vec())
    }
}

impl IntoParam for Vec<u8> {
    fn into_param(self) -> Value {
        Value::Bytes(self)
    }
}

impl IntoParam for &str {
    fn into_param(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl IntoParam for String {
    fn into_param(self) -> Value {
        Value::Text(self)
    }
}

impl IntoParam for u64 {
    fn into_param(self) -> Value {
        Value::Integer(self.into())
    }
}

impl IntoParam for bool {
    fn into_param(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoParam for Vec<Vec<u8>> {
    fn into_param(self) -> Value {
        Value::Array(self.into_iter().map(Value::Bytes).collect())
    }
}

fn mismatch(expected: &str, value: &Value) -> ProtocolError {
    ProtocolError::InvalidParams(format!("expected {expected}, got {value:?}"))
}

impl FromParam for Vec<u8> {
    fn from_param(value: &Value) -> ProtocolResult<Self> {
        match value {
            Value::Bytes(bytes) => Ok(bytes.clone()),
            other => Err(mismatch("bytes", other)),
        }
    }
}

impl FromParam for String {
    fn from_param(value: &Value) -> ProtocolResult<Self> {
        match value {
            Value::Text(text) => Ok(text.clone()),
            other => Err(mismatch("text", other)),
        }
    }
}

impl FromParam for u64 {
    fn from_param(value: &Value) -> ProtocolResult<Self> {
        match value {
            Value::Integer(int) => u64::try_from(*int).map_err(|_| mismatch("uint64", value)),
            other => Err(mismatch("uint64", other)),
        }
    }
}

impl FromParam for bool {
    fn from_param(value: &Value) -> ProtocolResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch("bool", other)),
        }
    }
}

impl FromParam for Vec<Vec<u8>> {
    fn from_param(value: &Value) -> ProtocolResult<Self> {
        match value {
            Value::Array(items) => items.iter().map(Vec::<u8>::from_param).collect(),
            other => Err(mismatch("array of bytes", other)),
        }
    }
}

/// Checks that exactly `expected` arguments were passed.
pub fn expect_arity(params: &[Value], expected: usize) -> ProtocolResult<()> {
    if params.len() != expected {
        return Err(ProtocolError::InvalidParams(format!(
            "expected {expected} arguments, got {}",
            params.len()
        )));
    }
    Ok(())
}

/// Decodes argument `index`.
pub fn param<T: FromParam>(params: &[Value], index: usize) -> ProtocolResult<T> {
    let value = params.get(index).ok_or_else(|| {
        ProtocolError::InvalidParams(format!("missing value for required argument {index}"))
    })?;
    T::from_param(value).map_err(|e| match e {
        ProtocolError::InvalidParams(msg) => {
            ProtocolError::InvalidParams(format!("invalid argument {index}: {msg}"))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_params() {
        assert_eq!(u64::from_param(&42u64.into_param()).unwrap(), 42);
        assert_eq!(u64::from_param(&u64::MAX.into_param()).unwrap(), u64::MAX);
        assert!(u64::from_param(&Value::Integer((-1i64).into())).is_err());
    }

    #[test]
    fn nested_bytes() {
        let items = vec![b"a".to_vec(), Vec::new(), b"ccc".to_vec()];
        let value = items.clone().into_param();
        assert_eq!(Vec::<Vec<u8>>::from_param(&value).unwrap(), items);
    }

    #[test]
    fn type_mismatch_is_invalid_params() {
        let params = vec!["headers".into_param()];
        assert!(matches!(
            param::<u64>(&params, 0),
            Err(ProtocolError::InvalidParams(msg)) if msg.contains("argument 0")
        ));
    }

    #[test]
    fn missing_argument() {
        let params = vec![b"key".as_slice().into_param()];
        assert!(param::<Vec<u8>>(&params, 0).is_ok());
        assert!(matches!(
            param::<u64>(&params, 1),
            Err(ProtocolError::InvalidParams(_))
        ));
    }

    #[test]
    fn arity_check() {
        assert!(expect_arity(&[], 0).is_ok());
        assert!(expect_arity(&[true.into_param()], 0).is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn bytes_survive_marshalling(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
                let value = bytes.clone().into_param();
                prop_assert_eq!(Vec::<u8>::from_param(&value).unwrap(), bytes);
                prop_assert!(u64::from_param(&value).is_err());
            }

            #[test]
            fn integers_survive_marshalling(n in any::<u64>()) {
                prop_assert_eq!(u64::from_param(&n.into_param()).unwrap(), n);
            }

            #[test]
            fn text_survives_marshalling(text in "[a-z./]{0,24}") {
                let value = text.as_str().into_param();
                prop_assert_eq!(String::from_param(&value).unwrap(), text);
                prop_assert!(Vec::<u8>::from_param(&value).is_err());
            }

            #[test]
            fn item_lists_survive_marshalling(
                items in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), 0..8),
            ) {
                let value = items.clone().into_param();
                prop_assert_eq!(Vec::<Vec<u8>>::from_param(&value).unwrap(), items);
            }
        }
    }
}
