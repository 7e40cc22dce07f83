//! # Status Fetch Integration Tests
//!
//! Purpose: Drive `StatusFetcher` against scripted fake servers over real TCP.
//!
//! ## Design Principles
//!
//! 1. **End-to-End**: Exercise connect, request, partial reads, and close.
//! 2. **Scripted Peers**: Each test server decides exactly which bytes to send
//!    and when, including stalls and early disconnects.
//! 3. **Isolated Server**: Bind to an ephemeral port per test.

use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, Barrier};

use hkv_client::{FetchConfig, StatusFetcher};
use hkv_common::{FramingError, HkvError};

const INFO_REQUEST: &[u8] = b"*1\r\n$4\r\nINFO\r\n";

async fn spawn_test_server<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(TcpStream, usize) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut accepted = 0;
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(value) => value,
                Err(_) => break,
            };
            accepted += 1;
            tokio::spawn(handler(stream, accepted));
        }
    });

    addr
}

async fn expect_info_request(stream: &mut TcpStream) {
    let mut request = [0u8; INFO_REQUEST.len()];
    stream.read_exact(&mut request).await.unwrap();
    assert_eq!(&request[..], INFO_REQUEST);
}

async fn send_in_pieces(stream: &mut TcpStream, data: &[u8], piece: usize) {
    stream.set_nodelay(true).unwrap();
    for chunk in data.chunks(piece) {
        stream.write_all(chunk).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

fn bulk(payload: &str) -> Vec<u8> {
    format!("${}\r\n{}\r\n", payload.len(), payload).into_bytes()
}

fn fetcher(addr: SocketAddr, idle_timeout: Duration) -> StatusFetcher {
    StatusFetcher::new(FetchConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        idle_timeout,
    })
}

#[tokio::test]
async fn resolves_record_from_fragmented_reply() {
    let payload = "# Server\nuptime:1234\nconnected_clients:2\nnote:a:b\r\nkeys: 9 \n";
    let addr = spawn_test_server(move |mut stream, _| async move {
        expect_info_request(&mut stream).await;
        send_in_pieces(&mut stream, &bulk(payload), 3).await;
    })
    .await;

    let record = fetcher(addr, Duration::from_secs(2)).fetch_status().await.unwrap();
    assert_eq!(record.get("uptime"), Some("1234"));
    assert_eq!(record.get("connected_clients"), Some("2"));
    assert_eq!(record.get("note"), Some("a:b"));
    assert_eq!(record.get("keys"), Some("9"));
    assert_eq!(record.len(), 4);
}

#[tokio::test]
async fn resolves_record_from_byte_by_byte_reply() {
    let addr = spawn_test_server(|mut stream, _| async move {
        expect_info_request(&mut stream).await;
        send_in_pieces(&mut stream, &bulk("uptime:1\n"), 1).await;
    })
    .await;

    let record = fetcher(addr, Duration::from_secs(2)).fetch_status().await.unwrap();
    assert_eq!(record.get("uptime"), Some("1"));
}

#[tokio::test]
async fn nil_reply_resolves_empty_record() {
    let addr = spawn_test_server(|mut stream, _| async move {
        expect_info_request(&mut stream).await;
        send_in_pieces(&mut stream, b"$-1\r\n", 2).await;
    })
    .await;

    let record = fetcher(addr, Duration::from_secs(2)).fetch_status().await.unwrap();
    assert!(record.is_empty());
}

#[tokio::test]
async fn error_reply_is_protocol_error() {
    let addr = spawn_test_server(|mut stream, _| async move {
        expect_info_request(&mut stream).await;
        stream.write_all(b"-ERR unknown command\r\n").await.unwrap();
    })
    .await;

    let err = fetcher(addr, Duration::from_secs(2)).fetch_status().await.unwrap_err();
    assert!(
        matches!(err, HkvError::Protocol(FramingError::UnexpectedPrefix(b'-'))),
        "{err:?}"
    );
}

#[tokio::test]
async fn malformed_length_is_protocol_error() {
    let addr = spawn_test_server(|mut stream, _| async move {
        expect_info_request(&mut stream).await;
        stream.write_all(b"$12x\r\nuptime:1\r\n").await.unwrap();
    })
    .await;

    let err = fetcher(addr, Duration::from_secs(2)).fetch_status().await.unwrap_err();
    assert!(matches!(err, HkvError::Protocol(FramingError::InvalidLength)), "{err:?}");
}

#[tokio::test]
async fn silent_server_times_out_and_socket_is_closed() {
    let (closed_tx, closed_rx) = oneshot::channel::<usize>();
    let closed_tx = Arc::new(std::sync::Mutex::new(Some(closed_tx)));

    let addr = spawn_test_server(move |mut stream, _| {
        let closed_tx = Arc::clone(&closed_tx);
        async move {
            expect_info_request(&mut stream).await;
            // Keep reading until the client goes away.
            let mut buf = [0u8; 64];
            let mut extra = 0;
            loop {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => extra += n,
                }
            }
            if let Some(tx) = closed_tx.lock().unwrap().take() {
                let _ = tx.send(extra);
            }
        }
    })
    .await;

    let bound = Duration::from_millis(100);
    let started = Instant::now();
    let err = fetcher(addr, bound).fetch_status().await.unwrap_err();
    assert!(started.elapsed() >= bound);
    assert!(matches!(err, HkvError::Timeout(d) if d == bound), "{err:?}");

    let extra = tokio::time::timeout(Duration::from_secs(2), closed_rx)
        .await
        .expect("server never observed the close")
        .unwrap();
    assert_eq!(extra, 0);
}

#[tokio::test]
async fn stalled_partial_reply_times_out() {
    let addr = spawn_test_server(|mut stream, _| async move {
        expect_info_request(&mut stream).await;
        stream.write_all(b"$20\r\nuptime:").await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    })
    .await;

    let err = fetcher(addr, Duration::from_millis(100)).fetch_status().await.unwrap_err();
    assert!(matches!(err, HkvError::Timeout(_)), "{err:?}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn early_disconnect_is_connection_error() {
    let addr = spawn_test_server(|mut stream, _| async move {
        expect_info_request(&mut stream).await;
        stream.write_all(b"$20\r\nupt").await.unwrap();
    })
    .await;

    let err = fetcher(addr, Duration::from_secs(2)).fetch_status().await.unwrap_err();
    match err {
        HkvError::Connection(cause) => assert_eq!(cause.kind(), ErrorKind::UnexpectedEof),
        other => panic!("expected connection error, got {other:?}"),
    }
}

#[tokio::test]
async fn refused_connection_is_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = fetcher(addr, Duration::from_secs(2)).fetch_status().await.unwrap_err();
    assert!(matches!(err, HkvError::Connection(_)), "{err:?}");
}

#[tokio::test]
async fn client_closes_after_complete_reply() {
    let (closed_tx, closed_rx) = oneshot::channel::<()>();
    let closed_tx = Arc::new(std::sync::Mutex::new(Some(closed_tx)));

    let addr = spawn_test_server(move |mut stream, _| {
        let closed_tx = Arc::clone(&closed_tx);
        async move {
            expect_info_request(&mut stream).await;
            stream.write_all(&bulk("uptime:5\n")).await.unwrap();
            let mut buf = [0u8; 8];
            let n = stream.read(&mut buf).await.unwrap_or(0);
            assert_eq!(n, 0);
            if let Some(tx) = closed_tx.lock().unwrap().take() {
                let _ = tx.send(());
            }
        }
    })
    .await;

    let record = fetcher(addr, Duration::from_secs(2)).fetch_status().await.unwrap();
    assert_eq!(record.get("uptime"), Some("5"));
    tokio::time::timeout(Duration::from_secs(2), closed_rx)
        .await
        .expect("client kept the connection open")
        .unwrap();
}

#[tokio::test]
async fn concurrent_fetches_stay_isolated() {
    let barrier = Arc::new(Barrier::new(2));
    let served = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&served);

    let addr = spawn_test_server(move |mut stream, index| {
        let barrier = Arc::clone(&barrier);
        let counter = Arc::clone(&counter);
        async move {
            expect_info_request(&mut stream).await;
            // Hold both replies until both connections are open.
            barrier.wait().await;
            counter.fetch_add(1, Ordering::SeqCst);
            let reply = bulk(&format!("uptime:{index}\nconn:{index}\n"));
            send_in_pieces(&mut stream, &reply, 4).await;
        }
    })
    .await;

    let fetcher = fetcher(addr, Duration::from_secs(2));
    let (a, b) = tokio::join!(fetcher.fetch_status(), fetcher.fetch_status());
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(served.load(Ordering::SeqCst), 2);
    assert_eq!(a.get("uptime"), a.get("conn"));
    assert_eq!(b.get("uptime"), b.get("conn"));
    let mut uptimes = vec![a.get("uptime").unwrap(), b.get("uptime").unwrap()];
    uptimes.sort();
    assert_eq!(uptimes, vec!["1", "2"]);
}
