//! Integration tests for the remote client against a real server.

use ancientkv_client::{
    dial, ClientConfig, DatabaseClient, HttpTransport, LoopbackClient, LoopbackServer,
};
use ancientkv_core::{
    AncientReaderOp, AncientStore, Database, DbError, DbResult, KeyValueReader, KeyValueStore,
    KeyValueWriter,
};
use ancientkv_server::{Backend, RpcHandler, Service, ServiceConfig};
use ancientkv_storage::{FreezerTable, InMemoryEngine, KvLog, StorageConfig};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

/// Routes client requests straight into a server dispatcher.
struct InProcessServer {
    handler: Arc<RpcHandler>,
}

impl LoopbackServer for InProcessServer {
    fn handle_request(&self, body: &[u8]) -> Vec<u8> {
        self.handler.handle_bytes(body)
    }
}

fn fixture_engine() -> Arc<InMemoryEngine> {
    let engine = Arc::new(InMemoryEngine::new());
    engine.insert(b"k1", b"v1");
    engine.insert(b"empty", b"");
    engine.create_table("headers", 10);
    for i in 10..100u8 {
        engine.append_ancient("headers", &[i; 16]);
    }
    engine
}

fn loopback(
    engine: Arc<InMemoryEngine>,
) -> (
    Arc<Backend>,
    DatabaseClient<LoopbackClient<InProcessServer>>,
) {
    let service = Service::with_backend(
        ServiceConfig::new(StorageConfig::new("/unused")).without_http(),
        Backend::new(engine.clone()),
    );
    let client = DatabaseClient::new(LoopbackClient::new(InProcessServer {
        handler: service.handler(),
    }));
    (Arc::new(Backend::new(engine)), client)
}

fn same<T: PartialEq + std::fmt::Debug>(local: DbResult<T>, remote: DbResult<T>) {
    match (local, remote) {
        (Ok(l), Ok(r)) => assert_eq!(l, r),
        (Err(l), Err(r)) => assert_eq!(l.to_string(), r.to_string()),
        (l, r) => panic!("local {l:?} != remote {r:?}"),
    }
}

#[test]
fn remote_reads_match_local_reads() {
    let (backend, client) = loopback(fixture_engine());

    same(backend.has(b"k1"), client.has(b"k1"));
    same(backend.has(b"nope"), client.has(b"nope"));
    same(backend.get(b"k1"), client.get(b"k1"));
    same(backend.get(b"empty"), client.get(b"empty"));
    same(backend.get(b"nope"), client.get(b"nope"));
    same(backend.has_ancient("headers", 50), client.has_ancient("headers", 50));
    same(backend.has_ancient("bodies", 0), client.has_ancient("bodies", 0));
    same(backend.ancient("headers", 99), client.ancient("headers", 99));
    same(backend.ancient("headers", 3), client.ancient("headers", 3));
    same(backend.ancient("headers", 100), client.ancient("headers", 100));
    same(backend.ancient("bodies", 0), client.ancient("bodies", 0));
    same(backend.ancients(), client.ancients());
    same(backend.ancient_size("headers"), client.ancient_size("headers"));
    same(backend.stat("kv.entries"), client.stat("kv.entries"));
    same(backend.stat("bogus"), client.stat("bogus"));
}

#[test]
fn remote_range_scenarios() {
    let (_, client) = loopback(fixture_engine());

    let items = client.ancient_range("headers", 95, 10, 1_000_000).unwrap();
    assert_eq!(items.len(), 5);
    assert_eq!(items[4], vec![99; 16]);

    let items = client.ancient_range("headers", 50, 5, 1).unwrap();
    assert_eq!(items, vec![vec![50; 16]]);

    assert!(matches!(
        client.ancient_range("headers", 2, 5, 100),
        Err(DbError::OutOfRange { index: 2, tail: 10, .. })
    ));
}

#[test]
fn remote_writes_are_unsupported_and_harmless() {
    let engine = fixture_engine();
    let (_, client) = loopback(engine.clone());

    assert!(matches!(client.put(b"k1", b"v2"), Err(DbError::NotSupported)));
    assert!(matches!(client.truncate_tail(50), Err(DbError::NotSupported)));
    assert!(matches!(client.close(), Err(DbError::NotSupported)));
    assert_eq!(client.get(b"k1").unwrap(), b"v1");
    assert!(!engine.is_closed());
}

#[test]
fn read_ancients_through_client() {
    let (_, client) = loopback(fixture_engine());
    let mut items = Vec::new();
    client
        .read_ancients(&mut |reader| {
            for number in 10..13 {
                items.push(reader.ancient("headers", number)?);
            }
            Ok(())
        })
        .unwrap();
    assert_eq!(items, vec![vec![10; 16], vec![11; 16], vec![12; 16]]);
}

fn disk_config() -> (tempfile::TempDir, StorageConfig) {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig::new(dir.path());
    let log = KvLog::create(&config.kv_log_path()).unwrap();
    log.put(b"k1", b"v1").unwrap();
    log.sync().unwrap();
    let headers = FreezerTable::create(&config.ancient_dir(), "headers", 0).unwrap();
    for i in 0..100u8 {
        headers.append(&[i; 8]).unwrap();
    }
    headers.sync().unwrap();
    (dir, config)
}

#[test]
fn http_end_to_end() {
    let (_dir, storage) = disk_config();
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let config = ServiceConfig::new(storage).with_http("127.0.0.1:0");
    let service = Service::new(config).unwrap();
    let endpoints = runtime.block_on(async {
        service.serve().unwrap();
        service.start_endpoints().await.unwrap()
    });
    let url = format!("http://{}", endpoints.http_addr().unwrap());

    let client_config = ClientConfig::default().with_timeout(Duration::from_secs(5));
    let client = DatabaseClient::new(HttpTransport::new(url.clone(), &client_config).unwrap());
    assert_eq!(client.get(b"k1").unwrap(), b"v1");
    assert!(client.get(b"nope").unwrap_err().is_not_found());
    assert_eq!(client.ancients().unwrap(), 100);
    assert_eq!(
        client.ancient_range("headers", 95, 10, 1_000_000).unwrap().len(),
        5
    );

    let db = dial(&url, &client_config).unwrap();
    assert!(db.has_ancient("headers", 0).unwrap());
    assert!(matches!(db.put(b"k1", b"v2"), Err(DbError::NotSupported)));
    drop(db);
    drop(client);

    runtime.block_on(async {
        endpoints.shutdown().await;
        service.stop();
        service.wait().await.unwrap();
    });
}

#[cfg(unix)]
#[test]
fn ipc_end_to_end() {
    let (_dir, storage) = disk_config();
    let socket_dir = tempfile::tempdir().unwrap();
    let socket = socket_dir.path().join("ancientkv.ipc");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let config = ServiceConfig::new(storage)
        .without_http()
        .with_ipc(&socket);
    let service = Service::new(config).unwrap();
    let endpoints = runtime.block_on(async {
        service.serve().unwrap();
        service.start_endpoints().await.unwrap()
    });

    let endpoint = format!("ipc://{}", socket.display());
    let db = dial(&endpoint, &ClientConfig::default()).unwrap();
    assert_eq!(db.get(b"k1").unwrap(), b"v1");
    assert_eq!(db.ancient("headers", 42).unwrap(), vec![42; 8]);
    assert_eq!(db.stat("ancient.frozen").unwrap(), "100");
    drop(db);

    runtime.block_on(async {
        endpoints.shutdown().await;
        service.stop();
        service.wait().await.unwrap();
    });
}

#[derive(Debug, Clone)]
enum Read {
    Has(Vec<u8>),
    Get(Vec<u8>),
    HasAncient(u64),
    Ancient(u64),
    Range(u64, u64, u64),
    Ancients,
    Size,
}

fn read_strategy() -> impl Strategy<Value = Read> {
    let key = prop::collection::vec(any::<u8>(), 1..3);
    prop_oneof![
        key.clone().prop_map(Read::Has),
        key.prop_map(Read::Get),
        (0u64..120).prop_map(Read::HasAncient),
        (0u64..120).prop_map(Read::Ancient),
        (0u64..120, 0u64..20, 0u64..200).prop_map(|(s, c, m)| Read::Range(s, c, m)),
        Just(Read::Ancients),
        Just(Read::Size),
    ]
}

fn replay(db: &dyn Database, read: &Read) -> String {
    let out = match read {
        Read::Has(k) => db.has(k).map(|v| format!("{v}")),
        Read::Get(k) => db.get(k).map(|v| format!("{v:?}")),
        Read::HasAncient(n) => db.has_ancient("headers", *n).map(|v| format!("{v}")),
        Read::Ancient(n) => db.ancient("headers", *n).map(|v| format!("{v:?}")),
        Read::Range(s, c, m) => db.ancient_range("headers", *s, *c, *m).map(|v| format!("{v:?}")),
        Read::Ancients => db.ancients().map(|v| format!("{v}")),
        Read::Size => db.ancient_size("headers").map(|v| format!("{v}")),
    };
    match out {
        Ok(value) => format!("ok {value}"),
        Err(e) => format!("err {e}"),
    }
}

proptest! {
    #[test]
    fn replay_identity(reads in prop::collection::vec(read_strategy(), 1..24)) {
        let engine = Arc::new(InMemoryEngine::new());
        for key in [&b"a"[..], &b"ab"[..], &b"\x00"[..]] {
            engine.insert(key, &[key.len() as u8; 3]);
        }
        engine.create_table("headers", 20);
        for i in 20..80u8 {
            engine.append_ancient("headers", &vec![i; (i % 7) as usize]);
        }
        let (backend, client) = loopback(engine);

        for read in &reads {
            prop_assert_eq!(replay(&*backend, read), replay(&client, read));
        }
    }
}
