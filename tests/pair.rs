use std::thread;
use std::time::Duration;

use netbase::{ErrorKind, Network, SocketPair, SocketPairMode};

#[test]
fn wake_unblocks_a_blocked_reader() {
    let network = Network::create().unwrap();
    let mut pair = SocketPair::create(network.clone(), SocketPairMode::Blocking).unwrap();

    let reader = pair.reader();
    let reader_network = network.clone();

    let handle = thread::spawn(move || {
        let mut buffer = [0u8; 4];
        reader_network.recv(reader, &mut buffer).unwrap()
    });

    // give the reader a moment to block in the kernel
    thread::sleep(Duration::from_millis(100));

    let sent = network.send(pair.writer(), b"w").unwrap();
    assert_eq!(sent, 1);

    let received = handle.join().unwrap();
    assert_eq!(received, 1);

    pair.stop().unwrap();
}

#[test]
fn drain_clears_the_pipe() {
    let network = Network::create().unwrap();
    let mut pair = SocketPair::create(network.clone(), SocketPairMode::NonBlocking).unwrap();

    for _ in 0..3 {
        network.send(pair.writer(), b"x").unwrap();
    }

    // loopback delivery is asynchronous; give the bytes time to land
    thread::sleep(Duration::from_millis(100));

    pair.drain().unwrap();

    let mut buffer = [0u8; 16];
    let failure = network.recv(pair.reader(), &mut buffer).unwrap_err();
    assert_eq!(failure, ErrorKind::NetWouldBlock);

    pair.stop().unwrap();
}

#[test]
fn start_is_idempotent() {
    let network = Network::create().unwrap();
    let mut pair = SocketPair::create(network, SocketPairMode::NonBlocking).unwrap();

    let reader = pair.reader();
    let writer = pair.writer();
    assert!(reader.is_valid());
    assert!(writer.is_valid());

    pair.start(SocketPairMode::NonBlocking).unwrap();
    assert_eq!(pair.reader(), reader);
    assert_eq!(pair.writer(), writer);

    pair.stop().unwrap();
}

#[test]
fn stop_invalidates_both_endpoints() {
    let network = Network::create().unwrap();
    let mut pair = SocketPair::create(network, SocketPairMode::NonBlocking).unwrap();

    pair.stop().unwrap();
    assert!(!pair.reader().is_valid());
    assert!(!pair.writer().is_valid());

    // safe to call again, and drain now reports the missing pipe
    pair.stop().unwrap();
    assert_eq!(pair.drain().unwrap_err(), ErrorKind::NotInitialized);
}

#[test]
fn endpoints_are_connected_to_each_other() {
    let network = Network::create().unwrap();
    let mut pair = SocketPair::create(network.clone(), SocketPairMode::NonBlocking).unwrap();

    let reader_local = network.get_sock_name(pair.reader()).unwrap();
    let writer_peer = network.get_peer_name(pair.writer()).unwrap();
    assert_eq!(reader_local, writer_peer);

    pair.stop().unwrap();
}
