//! # AncientKV Protocol
//!
//! RPC message types and CBOR codecs for AncientKV.
//!
//! A call is an [`RpcRequest`] naming a qualified method
//! (`<namespace>_<method>`) with positional arguments; the answer is an
//! [`RpcResponse`] carrying either a result value or an
//! [`RpcErrorObject`]. Both are CBOR-encoded with `ciborium`.
//!
//! Stream transports wrap each message in a length-prefixed frame
//! (see [`encode_frame`]).

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod frame;
mod message;
mod params;

pub use ciborium::Value;
pub use error::{codes, ProtocolError, ProtocolResult, RpcErrorObject};
pub use frame::{encode_frame, frame_len, FRAME_HEADER_LEN, MAX_FRAME_LEN};
pub use message::{RpcRequest, RpcResponse};
pub use params::{expect_arity, param, FromParam, IntoParam};

/// Namespace the read-only API is registered under.
pub const API_NAMESPACE: &str = "leveldb";

/// Version of the read-only API.
pub const API_VERSION: &str = "0.0.1";

/// Method names of the read-only API, without namespace.
pub mod methods {
    /// `has(key) -> bool`
    pub const HAS: &str = "has";
    /// `get(key) -> bytes`
    pub const GET: &str = "get";
    /// `hasAncient(kind, number) -> bool`
    pub const HAS_ANCIENT: &str = "hasAncient";
    /// `ancient(kind, number) -> bytes`
    pub const ANCIENT: &str = "ancient";
    /// `ancientRange(kind, start, count, maxBytes) -> [bytes]`
    pub const ANCIENT_RANGE: &str = "ancientRange";
    /// `ancients() -> uint64`
    pub const ANCIENTS: &str = "ancients";
    /// `ancientSize(kind) -> uint64`
    pub const ANCIENT_SIZE: &str = "ancientSize";
    /// `stat(property) -> string`
    pub const STAT: &str = "stat";

    /// Every method of the read-only API.
    pub const ALL: [&str; 8] = [
        HAS,
        GET,
        HAS_ANCIENT,
        ANCIENT,
        ANCIENT_RANGE,
        ANCIENTS,
        ANCIENT_SIZE,
        STAT,
    ];
}

/// Returns the wire name of `method` in `namespace`.
pub fn qualified(namespace: &str, method: &str) -> String {
    format!("{namespace}_{method}")
}
