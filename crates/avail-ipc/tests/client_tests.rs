use std::os::unix::net::UnixListener;
use std::time::{Duration, Instant};

use avail_core::{deserialize, Available, InterfaceAvailability};
use avail_ipc::{flush_availabilities, read_message, AvailabilityClient, TransportError, AVAILABILITY_REQUEST};
use tempfile::tempdir;

fn batch() -> Vec<InterfaceAvailability> {
    let mut a = InterfaceAvailability::new(5);
    a.set_available(Available::Unavailable);
    a.set_error("timeout");
    let mut b = InterfaceAvailability::new(5);
    b.set_available(Available::Available);
    vec![a, b]
}

#[test]
fn test_flush_sends_one_request_per_batch_on_one_connection() {
    let dir = tempdir().unwrap();
    let socket = dir.path().join("availability.sock");
    let listener = UnixListener::bind(&socket).unwrap();

    let server = std::thread::spawn(move || {
        let (mut conn, _) = listener.accept().unwrap();
        let first = read_message(&mut conn).unwrap();
        let second = read_message(&mut conn).unwrap();
        (first, second)
    });

    let mut client = AvailabilityClient::new(&socket, Duration::from_secs(5));
    assert!(!client.is_connected());
    flush_availabilities(&mut client, &batch()).unwrap();
    assert!(client.is_connected());
    flush_availabilities(&mut client, &[]).unwrap();

    let ((code, data), (code2, data2)) = server.join().unwrap();
    assert_eq!(code, AVAILABILITY_REQUEST);
    let records = deserialize(&data).unwrap();
    assert_eq!(records, batch());

    assert_eq!(code2, AVAILABILITY_REQUEST);
    assert!(data2.is_empty());
}

#[test]
fn test_unreachable_service_fails_within_bound() {
    let dir = tempdir().unwrap();
    let socket = dir.path().join("missing.sock");
    let mut client = AvailabilityClient::new(&socket, Duration::from_millis(1500));

    let started = Instant::now();
    let err = flush_availabilities(&mut client, &batch()).unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, TransportError::Connect { .. }));
    assert!(elapsed >= Duration::from_millis(1500));
    assert!(elapsed < Duration::from_secs(5), "connect took {:?}", elapsed);
    assert!(!client.is_connected());
}

#[test]
fn test_service_coming_up_late_is_reached() {
    let dir = tempdir().unwrap();
    let socket = dir.path().join("late.sock");
    let bind_path = socket.clone();

    let server = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(500));
        let listener = UnixListener::bind(&bind_path).unwrap();
        let (mut conn, _) = listener.accept().unwrap();
        read_message(&mut conn).unwrap()
    });

    let mut client = AvailabilityClient::new(&socket, Duration::from_secs(10));
    flush_availabilities(&mut client, &batch()).unwrap();

    let (code, _) = server.join().unwrap();
    assert_eq!(code, AVAILABILITY_REQUEST);
}
