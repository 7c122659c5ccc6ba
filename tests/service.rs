use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use netbase::network::options;
use netbase::{
    BackendType, ErrorKind, InetAddress, Network, ServiceParams, SocketAddress, SocketEvent,
    SocketOperation, SocketService, TCP_V4,
};

fn service(network: &Arc<Network>) -> SocketService {
    SocketService::create(ServiceParams::default(), network.clone()).unwrap()
}

#[test]
fn notify_interrupts_a_blocked_execute() {
    let network = Network::create().unwrap();
    let service = Arc::new(service(&network));

    let notifier = service.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        notifier.notify();
    });

    let mut events: Vec<SocketEvent> = Vec::new();
    let start = Instant::now();
    let count = service.execute(Some(Duration::from_secs(10)), &mut events).unwrap();

    assert_eq!(count, 0);
    assert!(events.is_empty());
    assert!(
        start.elapsed() < Duration::from_secs(5),
        "notify did not interrupt the wait"
    );

    handle.join().unwrap();
    service.stop().unwrap();
}

#[test]
fn zero_timeout_polls_and_returns() {
    let network = Network::create().unwrap();
    let service = service(&network);

    let mut events: Vec<SocketEvent> = Vec::new();
    let start = Instant::now();
    let count = service
        .execute(Some(Duration::from_millis(0)), &mut events)
        .unwrap();

    assert_eq!(count, 0);
    assert!(start.elapsed() < Duration::from_secs(1));

    service.stop().unwrap();
}

#[test]
fn notify_before_execute_returns_immediately() {
    let network = Network::create().unwrap();
    let service = service(&network);

    service.notify();

    let mut events: Vec<SocketEvent> = Vec::new();
    let start = Instant::now();
    let count = service.execute(Some(Duration::from_secs(5)), &mut events).unwrap();

    assert_eq!(count, 0);
    assert!(
        start.elapsed() < Duration::from_secs(1),
        "pending notify was not observed"
    );

    // the flag is one-shot: the next poll behaves normally
    let count = service
        .execute(Some(Duration::from_millis(0)), &mut events)
        .unwrap();
    assert_eq!(count, 0);

    service.stop().unwrap();
}

#[test]
fn lifecycle_failure_model() {
    let network = Network::create().unwrap();

    // before start, mutators and waits report the missing pollset
    let unstarted = SocketService::new(ServiceParams::default(), network.clone());
    let sock = network.create_socket(TCP_V4).unwrap();
    let mut events: Vec<SocketEvent> = Vec::new();

    assert_eq!(
        unstarted.add(sock, SocketOperation::READ).unwrap_err(),
        ErrorKind::NotInitialized
    );
    assert_eq!(
        unstarted.execute(Some(Duration::from_millis(0)), &mut events).unwrap_err(),
        ErrorKind::NotInitialized
    );

    // invalid sockets are rejected up front
    let service = service(&network);
    assert_eq!(
        service
            .add(netbase::INVALID_SOCKET, SocketOperation::READ)
            .unwrap_err(),
        ErrorKind::InvalidArgument
    );

    // stop is idempotent and cancels every later wait
    service.stop().unwrap();
    service.stop().unwrap();
    assert_eq!(
        service.execute(Some(Duration::from_millis(0)), &mut events).unwrap_err(),
        ErrorKind::Cancelled
    );
    assert_eq!(
        service.add(sock, SocketOperation::READ).unwrap_err(),
        ErrorKind::Failure
    );

    network.close(sock).unwrap();
}

#[test]
fn interest_set_merges_and_drops() {
    let network = Network::create().unwrap();
    let service = service(&network);

    let sock = network.create_socket(TCP_V4).unwrap();

    service
        .add(sock, SocketOperation::READ | SocketOperation::ERROR)
        .unwrap();
    // adding a subset of the current interest is a no-op
    service.add(sock, SocketOperation::READ).unwrap();
    // additive merge
    service.add(sock, SocketOperation::WRITE).unwrap();

    // subtracting the error interest drops the socket entirely, so a fresh
    // add must register it again rather than modify an existing entry
    service.remove(sock, SocketOperation::ERROR).unwrap();
    service.add(sock, SocketOperation::READ).unwrap();

    // a residual of nothing but error interest also drops the socket
    service.add(sock, SocketOperation::ERROR).unwrap();
    service.remove(sock, SocketOperation::READ).unwrap();
    service.add(sock, SocketOperation::WRITE).unwrap();

    // removing an unknown socket is quietly accepted
    let other = network.create_socket(TCP_V4).unwrap();
    service.remove(other, SocketOperation::READ).unwrap();
    service.close(other).unwrap();

    service.close(sock).unwrap();
    service.stop().unwrap();

    network.close(sock).unwrap();
    network.close(other).unwrap();
}

#[test]
fn echo_driven_through_the_service() {
    let network = Network::create().unwrap();
    let service = service(&network);

    let listener = network.create_socket(TCP_V4).unwrap();
    network
        .set_socket_option::<options::ReuseAddress>(listener, true)
        .unwrap();
    network
        .bind(listener, &SocketAddress::inet(InetAddress::LOOPBACK, 0))
        .unwrap();
    network.listen(listener, 4).unwrap();
    let bound = network.get_sock_name(listener).unwrap();

    let client = network.create_socket(TCP_V4).unwrap();
    network.set_blocking(client, false).unwrap();

    match network.connect(client, &bound) {
        Ok(()) => {}
        Err(failure) => assert_eq!(failure, ErrorKind::NetInProgress),
    }

    service
        .add(listener, SocketOperation::READ | SocketOperation::ERROR)
        .unwrap();
    service
        .add(client, SocketOperation::WRITE | SocketOperation::ERROR)
        .unwrap();

    let mut events: Vec<SocketEvent> = Vec::new();
    let mut accepted = netbase::INVALID_SOCKET;
    let mut sent = false;
    let mut echoed: Option<Vec<u8>> = None;
    let deadline = Instant::now() + Duration::from_secs(10);

    while echoed.is_none() {
        assert!(Instant::now() < deadline, "echo loop did not finish in time");

        service
            .execute(Some(Duration::from_millis(250)), &mut events)
            .unwrap();

        for index in 0..events.len() {
            let event = events[index];

            if event.sock == listener && event.events.contains(SocketOperation::READ) {
                let connection = network.accept(listener).unwrap();
                accepted = connection.sock;
                network.set_blocking(accepted, false).unwrap();
                service
                    .add(accepted, SocketOperation::READ | SocketOperation::ERROR)
                    .unwrap();
                service.close(listener).unwrap();
            } else if event.sock == client && event.events.contains(SocketOperation::WRITE) {
                if !sent {
                    assert_eq!(network.send(client, b"ping").unwrap(), 4);
                    sent = true;
                }
                service.remove(client, SocketOperation::WRITE).unwrap();
            } else if event.sock == accepted && event.events.contains(SocketOperation::READ) {
                let mut buffer = [0u8; 16];
                let received = network.recv(accepted, &mut buffer).unwrap();
                echoed = Some(buffer[..received].to_vec());
            }
        }
    }

    assert_eq!(echoed.unwrap(), b"ping");

    service.stop().unwrap();
    network.close(client).unwrap();
    network.close(accepted).unwrap();
    network.close(listener).unwrap();
}

#[test]
fn interest_mutation_wakes_a_blocked_execute() {
    let network = Network::create().unwrap();
    let service = Arc::new(service(&network));

    let sock = network.create_socket(TCP_V4).unwrap();

    let mutator = service.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        // an add during a wait sends a wake byte so the wait re-enters
        // with the new interest set
        mutator.add(sock, SocketOperation::READ).unwrap();
    });

    let mut events: Vec<SocketEvent> = Vec::new();
    let start = Instant::now();
    service.execute(Some(Duration::from_secs(10)), &mut events).unwrap();
    assert!(
        start.elapsed() < Duration::from_secs(5),
        "interest mutation did not wake the wait"
    );

    handle.join().unwrap();
    service.stop().unwrap();
    network.close(sock).unwrap();
}

#[test]
fn stop_interrupts_a_blocked_execute() {
    let network = Network::create().unwrap();
    let service = Arc::new(service(&network));

    let stopper = service.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        stopper.stop().unwrap();
    });

    let mut events: Vec<SocketEvent> = Vec::new();
    let start = Instant::now();
    // a stop racing the wait surfaces as a clean, empty return; a stop
    // that lands first cancels the wait outright
    match service.execute(Some(Duration::from_secs(10)), &mut events) {
        Ok(count) => assert_eq!(count, 0),
        Err(failure) => assert_eq!(failure, ErrorKind::Cancelled),
    }
    assert!(start.elapsed() < Duration::from_secs(5));

    handle.join().unwrap();

    assert_eq!(
        service.execute(Some(Duration::from_millis(0)), &mut events).unwrap_err(),
        ErrorKind::Cancelled
    );
}

#[cfg(unix)]
#[test]
fn select_backend_matches_the_contract() {
    let network = Network::create().unwrap();
    let params = ServiceParams {
        backend: Some(BackendType::Select),
        ..ServiceParams::default()
    };
    let service = Arc::new(SocketService::create(params, network.clone()).unwrap());
    assert_eq!(service.backend_type(), Some(BackendType::Select));

    // zero timeout polls
    let mut events: Vec<SocketEvent> = Vec::new();
    let count = service
        .execute(Some(Duration::from_millis(0)), &mut events)
        .unwrap();
    assert_eq!(count, 0);

    // notify wakes a blocked wait
    let notifier = service.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        notifier.notify();
    });

    let start = Instant::now();
    service.execute(Some(Duration::from_secs(10)), &mut events).unwrap();
    assert!(start.elapsed() < Duration::from_secs(5));

    handle.join().unwrap();
    service.stop().unwrap();
}

#[cfg(target_os = "linux")]
#[test]
fn default_backend_is_epoll() {
    let network = Network::create().unwrap();
    let service = service(&network);
    assert_eq!(service.backend_type(), Some(BackendType::Epoll));
    service.stop().unwrap();
}
