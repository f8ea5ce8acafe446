//! Error Propagation Tests
//!
//! Validates how transport faults and store failures surface through the
//! file API, and that the client recovers on the next call.

use crud_client::TransportError;
use crud_codec::RequestType;
use crud_fs::FsError;
use crud_sim::{FailingTransport, FailurePolicy, LoopbackTransport, SimServer};
use tests_scenarios::{formatted, read_all, session_over, test_config};

fn failing_session(
    server: &SimServer,
    policy: FailurePolicy,
) -> crud_fs::FileSystem<crud_client::CrudStore<FailingTransport<LoopbackTransport>>> {
    let transport = FailingTransport::new(LoopbackTransport::new(server.clone()), policy);
    session_over(transport, test_config())
}

fn set_policy(
    fs: &mut crud_fs::FileSystem<crud_client::CrudStore<FailingTransport<LoopbackTransport>>>,
    policy: FailurePolicy,
) {
    fs.store_mut()
        .client_mut()
        .transport_mut()
        .set_policy(policy);
}

/// Test: Refused connection fails the open without claiming a slot
#[test]
fn test_refused_connection_on_open() {
    let server = SimServer::new();
    let mut fs = failing_session(&server, FailurePolicy::RefuseConnect);

    let result = fs.open("a");
    assert!(matches!(
        result,
        Err(FsError::Transport(TransportError::Connect { .. }))
    ));
    assert!(fs.entries().iter().all(|entry| !entry.is_in_use()));
    assert!(!fs.is_initialized());

    set_policy(&mut fs, FailurePolicy::Never);
    assert!(fs.open("a").is_ok());
    assert_eq!(server.request_types(), vec![RequestType::Init]);
}

/// Test: Connection lost mid-request
///
/// The half-sent CREATE never reaches the store. The next write reconnects,
/// sends INIT again and succeeds.
#[test]
fn test_reconnect_after_send_failure() {
    let server = SimServer::new();
    let mut fs = failing_session(&server, FailurePolicy::Never);
    let fd = fs.open("a").unwrap();

    // header goes out, payload does not
    set_policy(&mut fs, FailurePolicy::AfterSends(1));
    let result = fs.write(fd, b"data");
    assert!(matches!(
        result,
        Err(FsError::Transport(TransportError::Send(_)))
    ));
    assert_eq!(fs.length(fd).unwrap(), 0);
    assert_eq!(server.object_count(), 0);
    assert!(!fs.is_initialized());

    set_policy(&mut fs, FailurePolicy::Never);
    server.clear_log();
    assert_eq!(fs.write(fd, b"data").unwrap(), 4);
    assert_eq!(
        server.request_types(),
        vec![RequestType::Init, RequestType::Create]
    );
    assert_eq!(server.connections(), 2);
    assert_eq!(read_all(&mut fs, fd).unwrap(), b"data");
}

/// Test: Peer closing the stream is a transport error
#[test]
fn test_peer_close_while_waiting() {
    let server = SimServer::new();
    let mut fs = failing_session(&server, FailurePolicy::AfterReceives(0));

    assert_eq!(
        fs.open("a"),
        Err(FsError::Transport(TransportError::Closed))
    );
    assert!(!fs.store().client().is_connected());
}

/// Test: Store failure on READ leaves position and connection alone
#[test]
fn test_read_failure_is_local_to_call() {
    let (server, mut fs) = formatted();
    let fd = fs.open("a").unwrap();
    fs.write(fd, b"abcdef").unwrap();
    fs.seek(fd, 2).unwrap();

    server.fail_next(RequestType::Read);
    let mut buffer = [0u8; 2];
    assert!(matches!(
        fs.read(fd, &mut buffer),
        Err(FsError::StoreFailure {
            request: RequestType::Read,
            ..
        })
    ));
    assert_eq!(fs.position(fd).unwrap(), 2);
    assert!(fs.is_initialized());

    assert_eq!(fs.read(fd, &mut buffer).unwrap(), 2);
    assert_eq!(&buffer, b"cd");
}

/// Test: DELETE failure during a growing write
///
/// The old object is still present, so the entry keeps it. The new object is
/// left behind in the store.
#[test]
fn test_delete_failure_keeps_old_object() {
    let (server, mut fs) = formatted();
    let fd = fs.open("a").unwrap();
    fs.write(fd, b"abc").unwrap();
    let old = fs.entry(fd).unwrap().object_id;
    let objects = server.object_count();

    server.fail_next(RequestType::Delete);
    assert!(matches!(
        fs.write(fd, b"defg"),
        Err(FsError::StoreFailure {
            request: RequestType::Delete,
            ..
        })
    ));

    let entry = fs.entry(fd).unwrap();
    assert_eq!(entry.object_id, old);
    assert_eq!(entry.length, 3);
    assert_eq!(server.object_count(), objects + 1);
    assert_eq!(read_all(&mut fs, fd).unwrap(), b"abc");
}

/// Test: Failed format leaves no volume to unmount
#[test]
fn test_failed_format_has_no_volume() {
    let server = SimServer::new();
    let mut fs = tests_scenarios::session(&server, test_config());
    server.fail_next(RequestType::Create);

    assert!(matches!(fs.format(), Err(FsError::StoreFailure { .. })));
    assert_eq!(fs.metadata_object(), None);
    assert!(matches!(fs.unmount(), Err(FsError::InvalidArgument(_))));
}

/// Test: Local errors cause no traffic
#[test]
fn test_local_errors_are_silent() {
    let (server, mut fs) = formatted();
    let fd = fs.open("a").unwrap();
    fs.write(fd, b"abc").unwrap();
    server.clear_log();

    assert!(fs.seek(fd, 9).is_err());
    assert!(fs.write(fd, b"").is_err());
    let max = fs.config().max_object_size as usize;
    assert!(matches!(
        fs.write(fd, &vec![0u8; max]),
        Err(FsError::Capacity(_))
    ));
    fs.close(fd).unwrap();
    assert!(fs.close(fd).is_err());
    assert!(server.exchanges().is_empty());
}
