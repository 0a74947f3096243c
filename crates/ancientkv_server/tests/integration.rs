//! Integration tests for the read-only backend and its endpoints.

use ancientkv_core::{
    AncientReaderOp, AncientStore, Database, DbError, KeyValueReader, KeyValueStore,
    KeyValueWriter,
};
use ancientkv_protocol::{
    codes, encode_frame, frame_len, IntoParam, RpcRequest, RpcResponse, Value, FRAME_HEADER_LEN,
};
use ancientkv_server::{Backend, Service, ServiceConfig, ServiceState};
use ancientkv_storage::{FreezerTable, InMemoryEngine, KvLog, StorageConfig};
use proptest::prelude::*;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

/// Builds an on-disk store with two keys and a `headers` table of 100
/// items whose first 10 have been pruned.
fn disk_store() -> (TempDir, StorageConfig) {
    let dir = tempdir().unwrap();
    let config = StorageConfig::new(dir.path());

    let log = KvLog::create(&config.kv_log_path()).unwrap();
    log.put(b"k1", b"v1").unwrap();
    log.put(b"k2", b"longer value").unwrap();
    log.sync().unwrap();

    let headers = FreezerTable::create(&config.ancient_dir(), "headers", 10).unwrap();
    for i in 10..100u8 {
        headers.append(&[i; 16]).unwrap();
    }
    headers.sync().unwrap();

    (dir, config)
}

#[test]
fn disk_backend_serves_reads() {
    let (_dir, config) = disk_store();
    let backend = Backend::open(&config).unwrap();

    assert!(backend.has(b"k1").unwrap());
    assert_eq!(backend.get(b"k2").unwrap(), b"longer value");
    assert!(backend.get(b"missing").unwrap_err().is_not_found());

    assert_eq!(backend.ancients().unwrap(), 100);
    assert_eq!(backend.tail().unwrap(), 10);
    assert_eq!(backend.ancient("headers", 42).unwrap(), vec![42; 16]);
    assert!(matches!(
        backend.ancient("headers", 5),
        Err(DbError::OutOfRange { index: 5, tail: 10, .. })
    ));

    let items = backend.ancient_range("headers", 95, 10, 1_000_000).unwrap();
    assert_eq!(items.len(), 5);
    assert_eq!(items[0], vec![95; 16]);

    let items = backend.ancient_range("headers", 50, 5, 1).unwrap();
    assert_eq!(items, vec![vec![50; 16]]);

    assert!(backend.ancient_size("headers").unwrap() > 90 * 16);
}

#[test]
fn disk_backend_rejects_writes_without_touching_files() {
    let (dir, config) = disk_store();
    let kv_before = std::fs::read(config.kv_log_path()).unwrap();
    let dat_before = std::fs::read(config.ancient_dir().join("headers.dat")).unwrap();

    let backend = Backend::open(&config).unwrap();
    assert!(matches!(backend.put(b"k1", b"v2"), Err(DbError::WriteNotAllowed)));
    assert!(matches!(backend.delete(b"k1"), Err(DbError::WriteNotAllowed)));
    assert!(matches!(backend.truncate_tail(50), Err(DbError::WriteNotAllowed)));
    assert!(matches!(backend.truncate_head(20), Err(DbError::WriteNotAllowed)));
    assert!(matches!(backend.compact(None, None), Err(DbError::WriteNotAllowed)));
    assert!(matches!(backend.close(), Err(DbError::WriteNotAllowed)));

    assert_eq!(backend.get(b"k1").unwrap(), b"v1");
    assert_eq!(backend.ancients().unwrap(), 100);
    assert_eq!(std::fs::read(config.kv_log_path()).unwrap(), kv_before);
    assert_eq!(
        std::fs::read(config.ancient_dir().join("headers.dat")).unwrap(),
        dat_before
    );
    drop(dir);
}

#[test]
fn stat_reports_engine_properties() {
    let (_dir, config) = disk_store();
    let backend = Backend::open(&config).unwrap();

    assert_eq!(backend.stat("kv.entries").unwrap(), "2");
    assert_eq!(backend.stat("eth/db/chaindata/ancient.frozen").unwrap(), "100");
    assert!(backend.stat("stats").unwrap().contains("ancient.headers"));
}

#[test]
fn read_ancients_over_disk() {
    let (_dir, config) = disk_store();
    let backend = Backend::open(&config).unwrap();

    let mut total = 0;
    backend
        .read_ancients(&mut |reader| {
            for number in reader.tail()?..reader.ancients()? {
                total += reader.ancient("headers", number)?.len();
            }
            Ok(())
        })
        .unwrap();
    assert_eq!(total, 90 * 16);
}

#[tokio::test]
async fn service_over_disk_store() {
    let (_dir, config) = disk_store();
    let config = ServiceConfig::new(config).without_http();
    let service = Service::new(config).unwrap();

    service.serve().unwrap();
    assert_eq!(service.state(), ServiceState::Serving);

    let handler = service.handler();
    let response = handler.handle(RpcRequest::new(
        1,
        "leveldb_ancientRange",
        vec![
            "headers".into_param(),
            95u64.into_param(),
            10u64.into_param(),
            1_000_000u64.into_param(),
        ],
    ));
    match response.into_result().unwrap() {
        Value::Array(items) => assert_eq!(items.len(), 5),
        other => panic!("unexpected result {other:?}"),
    }

    service.stop();
    service.wait().await.unwrap();
    assert!(matches!(service.backend().get(b"k1"), Err(DbError::Engine(_))));
}

#[cfg(unix)]
#[tokio::test]
async fn ipc_endpoint_round_trip() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::UnixStream;

    let socket_dir = tempdir().unwrap();
    let socket = socket_dir.path().join("ancientkv.ipc");

    let engine = Arc::new(InMemoryEngine::new());
    engine.insert(b"k1", b"v1");
    let config = ServiceConfig::new(StorageConfig::new("/unused"))
        .without_http()
        .with_ipc(&socket);
    let service = Service::with_backend(config, Backend::new(engine));
    service.serve().unwrap();
    let endpoints = service.start_endpoints().await.unwrap();
    assert!(socket.exists());

    let mut stream = UnixStream::connect(&socket).await.unwrap();
    for (id, method) in [(1u64, "leveldb_get"), (2, "leveldb_put")] {
        let request = RpcRequest::new(id, method, vec![b"k1".as_slice().into_param()]);
        let frame = encode_frame(&request.encode().unwrap()).unwrap();
        stream.write_all(&frame).await.unwrap();

        let mut header = [0u8; FRAME_HEADER_LEN];
        stream.read_exact(&mut header).await.unwrap();
        let mut body = vec![0u8; frame_len(header).unwrap()];
        stream.read_exact(&mut body).await.unwrap();
        let response = RpcResponse::decode(&body).unwrap();
        assert_eq!(response.id, id);

        if id == 1 {
            assert_eq!(response.into_result().unwrap(), Value::Bytes(b"v1".to_vec()));
        } else {
            assert_eq!(
                response.into_result().unwrap_err().code,
                codes::METHOD_NOT_FOUND
            );
        }
    }
    drop(stream);

    endpoints.shutdown().await;
    assert!(!socket.exists());
    service.stop();
    service.wait().await.unwrap();
}

#[tokio::test]
async fn http_endpoint_binds_ephemeral_port() {
    let engine = Arc::new(InMemoryEngine::new());
    let config = ServiceConfig::new(StorageConfig::new("/unused")).with_http("127.0.0.1:0");
    let service = Service::with_backend(config, Backend::new(engine));
    service.serve().unwrap();

    let endpoints = service.start_endpoints().await.unwrap();
    let addr = endpoints.http_addr().unwrap();
    assert_ne!(addr.port(), 0);

    endpoints.shutdown().await;
    service.stop();
    service.wait().await.unwrap();
}

proptest! {
    #[test]
    fn writes_leave_reads_unchanged(
        entries in prop::collection::btree_map(
            prop::collection::vec(any::<u8>(), 1..8),
            prop::collection::vec(any::<u8>(), 0..16),
            0..16,
        ),
        probe in prop::collection::vec(any::<u8>(), 1..8),
        value in prop::collection::vec(any::<u8>(), 0..16),
    ) {
        let engine = Arc::new(InMemoryEngine::new());
        for (k, v) in &entries {
            engine.insert(k, v);
        }
        let backend = Backend::new(engine);

        let before = (backend.has(&probe).unwrap(), backend.get(&probe).ok());
        prop_assert!(backend.put(&probe, &value).unwrap_err().is_write_rejection());
        prop_assert!(backend.delete(&probe).unwrap_err().is_write_rejection());
        let after = (backend.has(&probe).unwrap(), backend.get(&probe).ok());
        prop_assert_eq!(before, after);
    }

    #[test]
    fn has_agrees_with_get(
        entries in prop::collection::btree_map(
            prop::collection::vec(any::<u8>(), 1..4),
            prop::collection::vec(any::<u8>(), 0..8),
            0..16,
        ),
        probe in prop::collection::vec(any::<u8>(), 1..4),
    ) {
        let engine = Arc::new(InMemoryEngine::new());
        for (k, v) in &entries {
            engine.insert(k, v);
        }
        let backend = Backend::new(engine);

        let has = backend.has(&probe).unwrap();
        match backend.get(&probe) {
            Ok(value) => {
                prop_assert!(has);
                prop_assert_eq!(Some(&value), entries.get(&probe));
            }
            Err(e) => {
                prop_assert!(e.is_not_found());
                prop_assert!(!has);
            }
        }
    }
}
