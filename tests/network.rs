use std::time::Duration;

use netbase::network::options;
use netbase::{
    AddressInfo, AddressInfoFlags, ErrorKind, InetAddress, Network, SocketAddress,
    SocketProtocol, SocketShutdownMode, SocketType, TCP_V4, UDP_V4,
};

fn loopback_listener(network: &Network) -> (netbase::Socket, SocketAddress) {
    let listener = network.create_socket(TCP_V4).unwrap();
    network
        .set_socket_option::<options::ReuseAddress>(listener, true)
        .unwrap();

    let address = SocketAddress::inet(InetAddress::LOOPBACK, 0);
    network.bind(listener, &address).unwrap();
    network.listen(listener, 4).unwrap();

    let bound = network.get_sock_name(listener).unwrap();
    assert!(bound.port() > 0, "listener got a real port");
    (listener, bound)
}

#[test]
fn loopback_echo() {
    let network = Network::create().unwrap();
    let (listener, bound) = loopback_listener(&network);

    let client = network.create_socket(TCP_V4).unwrap();
    network.connect(client, &bound).unwrap();

    let accepted = network.accept(listener).unwrap();
    assert!(accepted.sock.is_valid());
    assert_eq!(accepted.address.family(), netbase::AddressFamily::Inet4);

    // the peer seen by the client is the listener's bound address
    let peer = network.get_peer_name(client).unwrap();
    assert_eq!(peer, bound);

    let sent = network.send(client, b"ping").unwrap();
    assert_eq!(sent, 4);

    let mut buffer = [0u8; 16];
    let received = network.recv(accepted.sock, &mut buffer).unwrap();
    assert_eq!(&buffer[..received], b"ping");

    // echo back the other way
    network.send(accepted.sock, b"pong").unwrap();
    let received = network.recv(client, &mut buffer).unwrap();
    assert_eq!(&buffer[..received], b"pong");

    network.close(client).unwrap();
    network.close(accepted.sock).unwrap();
    network.close(listener).unwrap();
}

#[test]
fn stream_recv_of_zero_is_disconnected() {
    let network = Network::create().unwrap();
    let (listener, bound) = loopback_listener(&network);

    let client = network.create_socket(TCP_V4).unwrap();
    network.connect(client, &bound).unwrap();
    let accepted = network.accept(listener).unwrap();

    network.close(client).unwrap();

    let mut buffer = [0u8; 16];
    let failure = network.recv(accepted.sock, &mut buffer).unwrap_err();
    assert_eq!(failure, ErrorKind::Disconnected);

    network.close(accepted.sock).unwrap();
    network.close(listener).unwrap();
}

#[test]
fn shutdown_write_surfaces_as_disconnect() {
    let network = Network::create().unwrap();
    let (listener, bound) = loopback_listener(&network);

    let client = network.create_socket(TCP_V4).unwrap();
    network.connect(client, &bound).unwrap();
    let accepted = network.accept(listener).unwrap();

    network
        .shutdown(client, SocketShutdownMode::Write)
        .unwrap();

    let mut buffer = [0u8; 16];
    let failure = network.recv(accepted.sock, &mut buffer).unwrap_err();
    assert_eq!(failure, ErrorKind::Disconnected);

    network.close(client).unwrap();
    network.close(accepted.sock).unwrap();
    network.close(listener).unwrap();
}

#[test]
fn empty_datagram_is_success() {
    let network = Network::create().unwrap();

    let receiver = network.create_socket(UDP_V4).unwrap();
    network
        .bind(receiver, &SocketAddress::inet(InetAddress::LOOPBACK, 0))
        .unwrap();
    let target = network.get_sock_name(receiver).unwrap();

    let sender = network.create_socket(UDP_V4).unwrap();
    let sent = network.send_to(sender, &target, b"").unwrap();
    assert_eq!(sent, 0);

    let mut buffer = [0u8; 16];
    let data = network.recv_from(receiver, &mut buffer).unwrap();
    assert_eq!(data.received, 0);
    assert_eq!(data.address.family(), netbase::AddressFamily::Inet4);

    network.close(sender).unwrap();
    network.close(receiver).unwrap();
}

#[test]
fn datagram_round_trip_carries_the_peer() {
    let network = Network::create().unwrap();

    let receiver = network.create_socket(UDP_V4).unwrap();
    network
        .bind(receiver, &SocketAddress::inet(InetAddress::LOOPBACK, 0))
        .unwrap();
    let target = network.get_sock_name(receiver).unwrap();

    let sender = network.create_socket(UDP_V4).unwrap();
    network
        .bind(sender, &SocketAddress::inet(InetAddress::LOOPBACK, 0))
        .unwrap();
    let sender_address = network.get_sock_name(sender).unwrap();

    network.send_to(sender, &target, b"datagram").unwrap();

    let mut buffer = [0u8; 64];
    let data = network.recv_from(receiver, &mut buffer).unwrap();
    assert_eq!(&buffer[..data.received], b"datagram");
    assert_eq!(data.address, sender_address);

    network.close(sender).unwrap();
    network.close(receiver).unwrap();
}

#[test]
fn socket_options_round_trip() {
    let network = Network::create().unwrap();
    let sock = network.create_socket(TCP_V4).unwrap();

    network
        .set_socket_option::<options::ReuseAddress>(sock, true)
        .unwrap();
    assert!(network.get_socket_option::<options::ReuseAddress>(sock).unwrap());

    network
        .set_socket_option::<options::KeepAlive>(sock, true)
        .unwrap();
    assert!(network.get_socket_option::<options::KeepAlive>(sock).unwrap());

    network
        .set_socket_option::<options::NoDelay>(sock, true)
        .unwrap();
    assert!(network.get_socket_option::<options::NoDelay>(sock).unwrap());

    // the kernel may round buffer sizes up, never down
    network
        .set_socket_option::<options::RecvBuf>(sock, 65536)
        .unwrap();
    assert!(network.get_socket_option::<options::RecvBuf>(sock).unwrap() >= 65536);

    network
        .set_socket_option::<options::RecvTimeout>(sock, Duration::from_secs(2))
        .unwrap();
    assert_eq!(
        network.get_socket_option::<options::RecvTimeout>(sock).unwrap(),
        Duration::from_secs(2)
    );

    assert_eq!(
        network.get_socket_option::<options::SocketError>(sock).unwrap(),
        0
    );
    assert_eq!(network.get_socket_type(sock).unwrap(), SocketType::Stream);

    network.close(sock).unwrap();
}

#[cfg(target_os = "linux")]
#[test]
fn divergent_options_per_platform() {
    let network = Network::create().unwrap();
    let sock = network.create_socket(TCP_V4).unwrap();

    // POSIX-only and Linux-only tags are live here
    network
        .set_socket_option::<options::ReusePort>(sock, true)
        .unwrap();
    network
        .set_socket_option::<options::TcpKeepIdle>(sock, Duration::from_secs(30))
        .unwrap();
    assert_eq!(
        network.get_socket_option::<options::TcpKeepIdle>(sock).unwrap(),
        Duration::from_secs(30)
    );

    // the Apple-only spelling is unsupported on Linux
    let failure = network
        .set_socket_option::<options::TcpKeepAlive>(sock, Duration::from_secs(30))
        .unwrap_err();
    assert_eq!(failure, ErrorKind::Unsupported);

    network.close(sock).unwrap();
}

#[test]
fn nonblocking_recv_would_block() {
    let network = Network::create().unwrap();
    let (listener, bound) = loopback_listener(&network);

    let client = network.create_socket(TCP_V4).unwrap();
    network.connect(client, &bound).unwrap();
    let accepted = network.accept(listener).unwrap();

    network.set_blocking(accepted.sock, false).unwrap();

    let mut buffer = [0u8; 16];
    let failure = network.recv(accepted.sock, &mut buffer).unwrap_err();
    assert_eq!(failure, ErrorKind::NetWouldBlock);

    network.close(client).unwrap();
    network.close(accepted.sock).unwrap();
    network.close(listener).unwrap();
}

#[test]
fn numeric_resolution() {
    let network = Network::create().unwrap();

    let mut hints = AddressInfo::hints();
    hints.flags = AddressInfoFlags::NUMERIC_HOST | AddressInfoFlags::NUMERIC_SERVICE;
    hints.socket_type = SocketType::Stream;
    hints.protocol = SocketProtocol::Tcp;

    let entries = network
        .resolve("127.0.0.1", Some("8080"), Some(&hints))
        .unwrap();
    assert!(!entries.is_empty());

    let entry = &entries[0];
    assert_eq!(entry.family, netbase::AddressFamily::Inet4);
    assert_eq!(
        entry.address,
        SocketAddress::inet(InetAddress::LOOPBACK, 8080)
    );

    let failure = network
        .resolve("definitely.not.a.real.host.invalid", None, Some(&hints))
        .unwrap_err();
    assert_eq!(failure, ErrorKind::NotFound);
}

#[test]
fn accept_would_block_when_nonblocking() {
    let network = Network::create().unwrap();
    let (listener, _) = loopback_listener(&network);

    network.set_blocking(listener, false).unwrap();
    let failure = network.accept(listener).unwrap_err();
    assert_eq!(failure, ErrorKind::NetWouldBlock);

    network.close(listener).unwrap();
}
