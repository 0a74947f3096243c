//! The remote database proxy.

use crate::config::ClientConfig;
use crate::transport::RpcTransport;
use ancientkv_core::{
    empty_iterator, AncientReaderOp, AncientStore, AncientWriteOp, Batch, Capability, Database,
    DbError, DbResult, KeyValueReader, KeyValueStore, KeyValueWriter, KvIterator, Snapshot,
};
use ancientkv_protocol::{
    methods, qualified, FromParam, IntoParam, RpcErrorObject, RpcRequest, RpcResponse, Value,
};
use std::sync::atomic::{AtomicU64, Ordering};

/// A [`Database`] whose reads are answered by a remote server.
///
/// Each read is one call over the transport; remote errors come back as
/// the same [`DbError`] kind the server-side backend produced. Writes,
/// maintenance and lifecycle calls fail locally with
/// [`DbError::NotSupported`] and never reach the transport.
pub struct DatabaseClient<T: RpcTransport> {
    transport: T,
    namespace: String,
    next_id: AtomicU64,
}

impl<T: RpcTransport> DatabaseClient<T> {
    /// Creates a client speaking the default namespace over `transport`.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, &ClientConfig::default())
    }

    /// Creates a client using the namespace in `config`.
    pub fn with_config(transport: T, config: &ClientConfig) -> Self {
        Self {
            transport,
            namespace: config.namespace.clone(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn call<R: FromParam>(&self, method: &str, params: Vec<Value>) -> DbResult<R> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, qualified(&self.namespace, method), params);
        let body = request
            .encode()
            .map_err(|e| DbError::Protocol(e.to_string()))?;

        let reply = self.transport.send(body).map_err(DbError::Transport)?;
        let response = RpcResponse::decode(&reply).map_err(|e| DbError::Protocol(e.to_string()))?;
        if response.id != id {
            return Err(DbError::Protocol(format!(
                "response id {} does not match request id {id}",
                response.id
            )));
        }

        let value = response
            .into_result()
            .map_err(RpcErrorObject::into_db_error)?;
        R::from_param(&value).map_err(|e| DbError::Protocol(e.to_string()))
    }

    fn unsupported(&self, operation: Capability) -> DbError {
        tracing::debug!(?operation, "operation not supported by remote client");
        DbError::NotSupported
    }
}

impl<T: RpcTransport> KeyValueReader for DatabaseClient<T> {
    fn has(&self, key: &[u8]) -> DbResult<bool> {
        self.call(methods::HAS, vec![key.into_param()])
    }

    fn get(&self, key: &[u8]) -> DbResult<Vec<u8>> {
        self.call(methods::GET, vec![key.into_param()])
    }
}

impl<T: RpcTransport> KeyValueWriter for DatabaseClient<T> {
    fn put(&self, _key: &[u8], _value: &[u8]) -> DbResult<()> {
        Err(self.unsupported(Capability::Put))
    }

    fn delete(&self, _key: &[u8]) -> DbResult<()> {
        Err(self.unsupported(Capability::Delete))
    }
}

impl<T: RpcTransport> KeyValueStore for DatabaseClient<T> {
    fn stat(&self, property: &str) -> DbResult<String> {
        self.call(methods::STAT, vec![property.into_param()])
    }

    fn compact(&self, _start: Option<&[u8]>, _limit: Option<&[u8]>) -> DbResult<()> {
        Err(self.unsupported(Capability::Compact))
    }

    fn new_batch(&self) -> Option<Box<dyn Batch>> {
        None
    }

    fn new_batch_with_size(&self, _size: usize) -> Option<Box<dyn Batch>> {
        None
    }

    fn new_iterator(&self, _prefix: &[u8], _start: &[u8]) -> KvIterator {
        empty_iterator()
    }

    fn new_snapshot(&self) -> DbResult<Box<dyn Snapshot>> {
        Err(self.unsupported(Capability::NewSnapshot))
    }
}

impl<T: RpcTransport> AncientReaderOp for DatabaseClient<T> {
    fn has_ancient(&self, kind: &str, number: u64) -> DbResult<bool> {
        self.call(
            methods::HAS_ANCIENT,
            vec![kind.into_param(), number.into_param()],
        )
    }

    fn ancient(&self, kind: &str, number: u64) -> DbResult<Vec<u8>> {
        self.call(methods::ANCIENT, vec![kind.into_param(), number.into_param()])
    }

    fn ancient_range(
        &self,
        kind: &str,
        start: u64,
        count: u64,
        max_bytes: u64,
    ) -> DbResult<Vec<Vec<u8>>> {
        self.call(
            methods::ANCIENT_RANGE,
            vec![
                kind.into_param(),
                start.into_param(),
                count.into_param(),
                max_bytes.into_param(),
            ],
        )
    }

    fn ancients(&self) -> DbResult<u64> {
        self.call(methods::ANCIENTS, Vec::new())
    }

    fn tail(&self) -> DbResult<u64> {
        Err(self.unsupported(Capability::Tail))
    }

    fn ancient_size(&self, kind: &str) -> DbResult<u64> {
        self.call(methods::ANCIENT_SIZE, vec![kind.into_param()])
    }
}

impl<T: RpcTransport> AncientStore for DatabaseClient<T> {
    fn read_ancients(
        &self,
        f: &mut dyn FnMut(&dyn AncientReaderOp) -> DbResult<()>,
    ) -> DbResult<()> {
        f(self)
    }

    fn modify_ancients(
        &self,
        _f: &mut dyn FnMut(&mut dyn AncientWriteOp) -> DbResult<()>,
    ) -> DbResult<i64> {
        Err(self.unsupported(Capability::ModifyAncients))
    }

    fn truncate_head(&self, _n: u64) -> DbResult<u64> {
        Err(self.unsupported(Capability::TruncateHead))
    }

    fn truncate_tail(&self, _n: u64) -> DbResult<u64> {
        Err(self.unsupported(Capability::TruncateTail))
    }

    fn sync(&self) -> DbResult<()> {
        Err(self.unsupported(Capability::Sync))
    }

    fn migrate_table(
        &self,
        _kind: &str,
        _convert: &mut dyn FnMut(&[u8]) -> DbResult<Vec<u8>>,
    ) -> DbResult<()> {
        Err(self.unsupported(Capability::MigrateTable))
    }

    fn ancient_datadir(&self) -> DbResult<String> {
        Err(self.unsupported(Capability::AncientDatadir))
    }
}

impl<T: RpcTransport> Database for DatabaseClient<T> {
    fn close(&self) -> DbResult<()> {
        Err(self.unsupported(Capability::Close))
    }
}
