//! The public read API and its method dispatcher.

use crate::backend::Backend;
use ancientkv_core::{AncientReaderOp, DbResult, KeyValueReader, KeyValueStore};
use ancientkv_protocol::{
    expect_arity, methods, param, qualified, IntoParam, ProtocolResult, RpcErrorObject,
    RpcRequest, RpcResponse, Value, API_NAMESPACE, API_VERSION,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// The remotely callable surface: the read operations of [`Backend`] and
/// nothing else.
///
/// Write operations have no entry here, so a call to `leveldb_put` fails
/// at dispatch with "method not found" before any backend code runs.
pub struct PublicApi {
    backend: Arc<Backend>,
}

impl PublicApi {
    /// Creates the API over `backend`.
    pub fn new(backend: Arc<Backend>) -> Self {
        Self { backend }
    }

    /// Reports whether `key` exists.
    pub fn has(&self, key: &[u8]) -> DbResult<bool> {
        self.backend.has(key)
    }

    /// Returns the value of `key`.
    pub fn get(&self, key: &[u8]) -> DbResult<Vec<u8>> {
        self.backend.get(key)
    }

    /// Reports whether item `number` of table `kind` is retained.
    pub fn has_ancient(&self, kind: &str, number: u64) -> DbResult<bool> {
        self.backend.has_ancient(kind, number)
    }

    /// Returns item `number` of table `kind`.
    pub fn ancient(&self, kind: &str, number: u64) -> DbResult<Vec<u8>> {
        self.backend.ancient(kind, number)
    }

    /// Returns consecutive items of table `kind` starting at `start`.
    pub fn ancient_range(
        &self,
        kind: &str,
        start: u64,
        count: u64,
        max_bytes: u64,
    ) -> DbResult<Vec<Vec<u8>>> {
        self.backend.ancient_range(kind, start, count, max_bytes)
    }

    /// Returns the number of frozen items.
    pub fn ancients(&self) -> DbResult<u64> {
        self.backend.ancients()
    }

    /// Returns the byte size of table `kind`.
    pub fn ancient_size(&self, kind: &str) -> DbResult<u64> {
        self.backend.ancient_size(kind)
    }

    /// Returns an engine statistic.
    pub fn stat(&self, property: &str) -> DbResult<String> {
        self.backend.stat(property)
    }
}

/// A registered API: a service published under a namespace.
#[derive(Clone)]
pub struct ApiDescriptor {
    /// Method name prefix.
    pub namespace: String,
    /// API version.
    pub version: String,
    /// The service answering the calls.
    pub service: Arc<PublicApi>,
    /// Whether the API is reachable by remote callers.
    pub public: bool,
}

impl ApiDescriptor {
    /// Describes the read API published by a service.
    pub fn read_api(service: Arc<PublicApi>) -> Self {
        Self {
            namespace: API_NAMESPACE.to_string(),
            version: API_VERSION.to_string(),
            service,
            public: true,
        }
    }
}

type MethodFn = fn(&PublicApi, &[Value]) -> Result<Value, RpcErrorObject>;

const METHOD_TABLE: [(&str, MethodFn); 8] = [
    (methods::HAS, call_has),
    (methods::GET, call_get),
    (methods::HAS_ANCIENT, call_has_ancient),
    (methods::ANCIENT, call_ancient),
    (methods::ANCIENT_RANGE, call_ancient_range),
    (methods::ANCIENTS, call_ancients),
    (methods::ANCIENT_SIZE, call_ancient_size),
    (methods::STAT, call_stat),
];

fn args(params: &[Value], arity: usize) -> Result<(), RpcErrorObject> {
    expect_arity(params, arity).map_err(RpcErrorObject::from)
}

fn arg<T: ancientkv_protocol::FromParam>(
    params: &[Value],
    index: usize,
) -> Result<T, RpcErrorObject> {
    let value: ProtocolResult<T> = param(params, index);
    value.map_err(RpcErrorObject::from)
}

fn reply<T: IntoParam>(result: DbResult<T>) -> Result<Value, RpcErrorObject> {
    result
        .map(IntoParam::into_param)
        .map_err(|e| RpcErrorObject::from(&e))
}

fn call_has(api: &PublicApi, params: &[Value]) -> Result<Value, RpcErrorObject> {
    args(params, 1)?;
    let key: Vec<u8> = arg(params, 0)?;
    reply(api.has(&key))
}

fn call_get(api: &PublicApi, params: &[Value]) -> Result<Value, RpcErrorObject> {
    args(params, 1)?;
    let key: Vec<u8> = arg(params, 0)?;
    reply(api.get(&key))
}

fn call_has_ancient(api: &PublicApi, params: &[Value]) -> Result<Value, RpcErrorObject> {
    args(params, 2)?;
    let kind: String = arg(params, 0)?;
    let number: u64 = arg(params, 1)?;
    reply(api.has_ancient(&kind, number))
}

fn call_ancient(api: &PublicApi, params: &[Value]) -> Result<Value, RpcErrorObject> {
    args(params, 2)?;
    let kind: String = arg(params, 0)?;
    let number: u64 = arg(params, 1)?;
    reply(api.ancient(&kind, number))
}

fn call_ancient_range(api: &PublicApi, params: &[Value]) -> Result<Value, RpcErrorObject> {
    args(params, 4)?;
    let kind: String = arg(params, 0)?;
    let start: u64 = arg(params, 1)?;
    let count: u64 = arg(params, 2)?;
    let max_bytes: u64 = arg(params, 3)?;
    reply(api.ancient_range(&kind, start, count, max_bytes))
}

fn call_ancients(api: &PublicApi, params: &[Value]) -> Result<Value, RpcErrorObject> {
    args(params, 0)?;
    reply(api.ancients())
}

fn call_ancient_size(api: &PublicApi, params: &[Value]) -> Result<Value, RpcErrorObject> {
    args(params, 1)?;
    let kind: String = arg(params, 0)?;
    reply(api.ancient_size(&kind))
}

fn call_stat(api: &PublicApi, params: &[Value]) -> Result<Value, RpcErrorObject> {
    args(params, 1)?;
    let property: String = arg(params, 0)?;
    reply(api.stat(&property))
}

/// Routes decoded requests to registered APIs by qualified method name.
pub struct RpcHandler {
    routes: HashMap<String, (Arc<PublicApi>, MethodFn)>,
    timeout: Duration,
}

impl RpcHandler {
    /// Builds the routing table for the public APIs in `apis`.
    pub fn new(apis: &[ApiDescriptor], timeout: Duration) -> Self {
        let mut routes = HashMap::new();
        for api in apis.iter().filter(|api| api.public) {
            for (name, method) in METHOD_TABLE {
                routes.insert(
                    qualified(&api.namespace, name),
                    (Arc::clone(&api.service), method),
                );
            }
            tracing::debug!(
                namespace = %api.namespace,
                version = %api.version,
                "registered api"
            );
        }
        Self { routes, timeout }
    }

    /// Returns the registered method names, sorted.
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.routes.keys().cloned().collect();
        names.sort();
        names
    }

    /// Answers one request.
    pub fn handle(&self, request: RpcRequest) -> RpcResponse {
        let Some((service, method)) = self.routes.get(&request.method) else {
            tracing::debug!(method = %request.method, "unknown method");
            return RpcResponse::failure(
                request.id,
                RpcErrorObject::method_not_found(&request.method),
            );
        };

        match method(service, &request.params) {
            Ok(result) => RpcResponse::success(request.id, result),
            Err(error) => {
                tracing::trace!(method = %request.method, code = error.code, "call failed");
                RpcResponse::failure(request.id, error)
            }
        }
    }

    /// Decodes a request body, answers it, and encodes the response.
    pub fn handle_bytes(&self, body: &[u8]) -> Vec<u8> {
        match RpcRequest::decode(body) {
            Ok(request) => encode_response(self.handle(request)),
            Err(e) => encode_response(RpcResponse::failure(0, RpcErrorObject::from(e))),
        }
    }

    /// Answers a request body on the blocking pool, bounded by the
    /// configured deadline.
    pub async fn dispatch(self: Arc<Self>, body: Vec<u8>) -> Vec<u8> {
        let request = match RpcRequest::decode(&body) {
            Ok(request) => request,
            Err(e) => return encode_response(RpcResponse::failure(0, RpcErrorObject::from(e))),
        };
        let id = request.id;
        let timeout = self.timeout;
        let handler = Arc::clone(&self);
        let task = tokio::task::spawn_blocking(move || handler.handle(request));

        let response = match tokio::time::timeout(timeout, task).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "request task failed");
                RpcResponse::failure(id, RpcErrorObject::internal("request task failed"))
            }
            Err(_) => {
                tracing::warn!(id, ?timeout, "request timed out");
                RpcResponse::failure(id, RpcErrorObject::internal("request timed out"))
            }
        };
        encode_response(response)
    }
}

fn encode_response(response: RpcResponse) -> Vec<u8> {
    let id = response.id;
    response
        .encode()
        .or_else(|e| RpcResponse::failure(id, RpcErrorObject::internal(e.to_string())).encode())
        .unwrap_or_default()
}
