use std::ffi::{CStr, CString};
use std::mem;
use std::ptr;
use std::time::Duration;

use libc::{c_int, c_void, socklen_t};

use crate::address::{AddressFamily, SocketAddress, SOCKADDR_STORAGE_SIZE};
use crate::error::{ErrorKind, Failure, Result};
use crate::network::{
    AcceptedSocket, AddressInfo, AddressInfoFlags, MessageOption, RecvFromData, Socket,
    SocketOpt, SocketOptionValue, SocketProtocol, SocketShutdownMode, SocketType,
};

pub(crate) fn startup() -> Result<()> {
    Ok(())
}

pub(crate) fn last_network_failure() -> Failure {
    Failure::last_os_error()
}

fn family_to_raw(family: AddressFamily) -> c_int {
    match family {
        AddressFamily::Unspecified => libc::AF_UNSPEC,
        AddressFamily::Inet4 => libc::AF_INET,
        AddressFamily::Inet6 => libc::AF_INET6,
        AddressFamily::Unix => libc::AF_UNIX,
    }
}

fn family_from_raw(family: c_int) -> AddressFamily {
    match family {
        libc::AF_INET => AddressFamily::Inet4,
        libc::AF_INET6 => AddressFamily::Inet6,
        libc::AF_UNIX => AddressFamily::Unix,
        _ => AddressFamily::Unspecified,
    }
}

fn socket_type_to_raw(socket_type: SocketType) -> c_int {
    match socket_type {
        SocketType::None => 0,
        SocketType::Stream => libc::SOCK_STREAM,
        SocketType::Datagram => libc::SOCK_DGRAM,
        SocketType::Raw => libc::SOCK_RAW,
    }
}

pub(crate) fn socket_type_from_raw(socket_type: i32) -> SocketType {
    match socket_type {
        libc::SOCK_STREAM => SocketType::Stream,
        libc::SOCK_DGRAM => SocketType::Datagram,
        libc::SOCK_RAW => SocketType::Raw,
        _ => SocketType::None,
    }
}

fn protocol_to_raw(protocol: SocketProtocol) -> c_int {
    match protocol {
        SocketProtocol::None => 0,
        SocketProtocol::Icmp => libc::IPPROTO_ICMP,
        SocketProtocol::Ip => libc::IPPROTO_IP,
        SocketProtocol::Raw => libc::IPPROTO_RAW,
        SocketProtocol::Tcp => libc::IPPROTO_TCP,
        SocketProtocol::Udp => libc::IPPROTO_UDP,
    }
}

fn protocol_from_raw(protocol: c_int) -> SocketProtocol {
    match protocol {
        libc::IPPROTO_ICMP => SocketProtocol::Icmp,
        libc::IPPROTO_TCP => SocketProtocol::Tcp,
        libc::IPPROTO_UDP => SocketProtocol::Udp,
        libc::IPPROTO_RAW => SocketProtocol::Raw,
        _ => SocketProtocol::None,
    }
}

fn message_flags_to_raw(flags: MessageOption) -> c_int {
    let mut raw = 0;

    if flags.contains(MessageOption::OUT_OF_BAND) {
        raw |= libc::MSG_OOB;
    }
    if flags.contains(MessageOption::PEEK) {
        raw |= libc::MSG_PEEK;
    }
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        if flags.contains(MessageOption::NO_SIGNAL) {
            raw |= libc::MSG_NOSIGNAL;
        }
        if flags.contains(MessageOption::CONFIRM) {
            raw |= libc::MSG_CONFIRM;
        }
    }

    raw
}

// Writes to a peer that went away must fail with EPIPE, not kill the
// process with SIGPIPE.
#[cfg(any(target_os = "linux", target_os = "android"))]
fn send_guard_flags() -> c_int {
    libc::MSG_NOSIGNAL
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn send_guard_flags() -> c_int {
    0
}

pub(crate) fn create_socket(
    family: AddressFamily,
    protocol: SocketProtocol,
    socket_type: SocketType,
) -> Result<Socket> {
    let fd = unsafe {
        libc::socket(
            family_to_raw(family),
            socket_type_to_raw(socket_type),
            protocol_to_raw(protocol),
        )
    };

    if fd < 0 {
        return Err(last_network_failure().with_context(format!(
            "failed to create socket (family={},protocol={:?},type={:?})",
            family, protocol, socket_type
        )));
    }

    #[cfg(any(target_os = "macos", target_os = "ios"))]
    unsafe {
        let one: c_int = 1;
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_NOSIGPIPE,
            &one as *const _ as *const c_void,
            mem::size_of::<c_int>() as socklen_t,
        );
    }

    Ok(Socket::from_raw(fd))
}

pub(crate) fn close(sock: Socket) -> Result<()> {
    if unsafe { libc::close(sock.raw()) } < 0 {
        return Err(last_network_failure()
            .with_context(format!("failed to close socket '{}'", sock)));
    }
    Ok(())
}

pub(crate) fn bind(sock: Socket, address: &SocketAddress) -> Result<()> {
    let mut buffer = [0u8; SOCKADDR_STORAGE_SIZE];
    let length = address.to_sockaddr(&mut buffer)?;

    let result = unsafe {
        libc::bind(
            sock.raw(),
            buffer.as_ptr() as *const libc::sockaddr,
            length as socklen_t,
        )
    };

    if result < 0 {
        return Err(last_network_failure()
            .with_context(format!("failed to bind socket '{}' to '{}'", sock, address)));
    }
    Ok(())
}

pub(crate) fn connect(sock: Socket, address: &SocketAddress) -> Result<()> {
    let mut buffer = [0u8; SOCKADDR_STORAGE_SIZE];
    let length = address.to_sockaddr(&mut buffer)?;

    let result = unsafe {
        libc::connect(
            sock.raw(),
            buffer.as_ptr() as *const libc::sockaddr,
            length as socklen_t,
        )
    };

    if result < 0 {
        return Err(last_network_failure()
            .with_context(format!("failed to connect socket '{}' to '{}'", sock, address)));
    }
    Ok(())
}

pub(crate) fn listen(sock: Socket, backlog: u32) -> Result<()> {
    if unsafe { libc::listen(sock.raw(), backlog as c_int) } < 0 {
        return Err(last_network_failure()
            .with_context(format!("failed to listen on '{}' (backlog={})", sock, backlog)));
    }
    Ok(())
}

pub(crate) fn accept(sock: Socket) -> Result<AcceptedSocket> {
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let mut length = mem::size_of::<libc::sockaddr_storage>() as socklen_t;

    let fd = unsafe {
        libc::accept(
            sock.raw(),
            &mut storage as *mut _ as *mut libc::sockaddr,
            &mut length,
        )
    };

    if fd < 0 {
        return Err(last_network_failure()
            .with_context(format!("failed to accept() on '{}'", sock)));
    }

    let address = storage_to_address(&storage, length as usize)
        .unwrap_or_else(|_| SocketAddress::inet(crate::address::InetAddress::ANY, 0));

    Ok(AcceptedSocket {
        sock: Socket::from_raw(fd),
        address,
    })
}

pub(crate) fn recv(sock: Socket, buffer: &mut [u8], flags: MessageOption) -> Result<usize> {
    let received = unsafe {
        libc::recv(
            sock.raw(),
            buffer.as_mut_ptr() as *mut c_void,
            buffer.len(),
            message_flags_to_raw(flags),
        )
    };

    if received < 0 {
        return Err(last_network_failure().with_context(format!(
            "failed recv() from '{}' for '{}' bytes",
            sock,
            buffer.len()
        )));
    }
    Ok(received as usize)
}

pub(crate) fn recv_from(
    sock: Socket,
    buffer: &mut [u8],
    flags: MessageOption,
) -> Result<RecvFromData> {
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let mut length = mem::size_of::<libc::sockaddr_storage>() as socklen_t;

    let received = unsafe {
        libc::recvfrom(
            sock.raw(),
            buffer.as_mut_ptr() as *mut c_void,
            buffer.len(),
            message_flags_to_raw(flags),
            &mut storage as *mut _ as *mut libc::sockaddr,
            &mut length,
        )
    };

    if received < 0 {
        return Err(last_network_failure().with_context(format!(
            "failed recvfrom() on '{}' for '{}' bytes",
            sock,
            buffer.len()
        )));
    }

    let address = storage_to_address(&storage, length as usize)
        .unwrap_or_else(|_| SocketAddress::inet(crate::address::InetAddress::ANY, 0));

    Ok(RecvFromData {
        received: received as usize,
        address,
    })
}

pub(crate) fn send(sock: Socket, buffer: &[u8], flags: MessageOption) -> Result<usize> {
    let sent = unsafe {
        libc::send(
            sock.raw(),
            buffer.as_ptr() as *const c_void,
            buffer.len(),
            message_flags_to_raw(flags) | send_guard_flags(),
        )
    };

    if sent < 0 {
        return Err(last_network_failure().with_context(format!(
            "failed send() on '{}' for '{}' bytes",
            sock,
            buffer.len()
        )));
    }
    Ok(sent as usize)
}

pub(crate) fn send_to(
    sock: Socket,
    address: &SocketAddress,
    buffer: &[u8],
    flags: MessageOption,
) -> Result<usize> {
    let mut addr = [0u8; SOCKADDR_STORAGE_SIZE];
    let length = address.to_sockaddr(&mut addr)?;

    let sent = unsafe {
        libc::sendto(
            sock.raw(),
            buffer.as_ptr() as *const c_void,
            buffer.len(),
            message_flags_to_raw(flags) | send_guard_flags(),
            addr.as_ptr() as *const libc::sockaddr,
            length as socklen_t,
        )
    };

    if sent < 0 {
        return Err(last_network_failure().with_context(format!(
            "failed sendto() on '{}' (address={}) for '{}' bytes",
            sock,
            address,
            buffer.len()
        )));
    }
    Ok(sent as usize)
}

pub(crate) fn get_sock_name(sock: Socket) -> Result<SocketAddress> {
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let mut length = mem::size_of::<libc::sockaddr_storage>() as socklen_t;

    let result = unsafe {
        libc::getsockname(
            sock.raw(),
            &mut storage as *mut _ as *mut libc::sockaddr,
            &mut length,
        )
    };

    if result < 0 {
        return Err(last_network_failure()
            .with_context(format!("failed to get socket name for '{}'", sock)));
    }

    storage_to_address(&storage, length as usize)
}

pub(crate) fn get_peer_name(sock: Socket) -> Result<SocketAddress> {
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let mut length = mem::size_of::<libc::sockaddr_storage>() as socklen_t;

    let result = unsafe {
        libc::getpeername(
            sock.raw(),
            &mut storage as *mut _ as *mut libc::sockaddr,
            &mut length,
        )
    };

    if result < 0 {
        return Err(last_network_failure()
            .with_context(format!("failed to get peer name for '{}'", sock)));
    }

    storage_to_address(&storage, length as usize)
}

pub(crate) fn set_blocking(sock: Socket, blocking: bool) -> Result<()> {
    let flags = unsafe { libc::fcntl(sock.raw(), libc::F_GETFL, 0) };
    if flags < 0 {
        return Err(last_network_failure()
            .with_context(format!("failed fcntl get-flags for '{}'", sock)));
    }

    let flags = if blocking {
        flags & !libc::O_NONBLOCK
    } else {
        flags | libc::O_NONBLOCK
    };

    if unsafe { libc::fcntl(sock.raw(), libc::F_SETFL, flags) } < 0 {
        return Err(last_network_failure()
            .with_context(format!("failed fcntl set-flags for '{}'", sock)));
    }
    Ok(())
}

pub(crate) fn shutdown(sock: Socket, mode: SocketShutdownMode) -> Result<()> {
    let how = match mode {
        SocketShutdownMode::Read => libc::SHUT_RD,
        SocketShutdownMode::Write => libc::SHUT_WR,
        SocketShutdownMode::Both => libc::SHUT_RDWR,
    };

    if unsafe { libc::shutdown(sock.raw(), how) } < 0 {
        return Err(last_network_failure()
            .with_context(format!("failed to shutdown() socket '{}' ({:?})", sock, mode)));
    }
    Ok(())
}

fn storage_to_address(storage: &libc::sockaddr_storage, length: usize) -> Result<SocketAddress> {
    let length = length
        .max(4)
        .min(mem::size_of::<libc::sockaddr_storage>());
    let bytes = unsafe {
        std::slice::from_raw_parts(storage as *const _ as *const u8, length)
    };
    SocketAddress::from_sockaddr(bytes)
}

// ---------------------------------------------------------------------------
// Socket options
// ---------------------------------------------------------------------------

enum OptKind {
    Bool,
    Int,
    DurationTimeval,
    DurationSecs,
    Linger,
    Multicast,
}

// Per-platform option table. A `None` entry means the tag is not available
// here and surfaces as `Unsupported`.
fn option_entry(opt: SocketOpt) -> Option<(c_int, c_int, OptKind)> {
    match opt {
        SocketOpt::Broadcast => Some((libc::SOL_SOCKET, libc::SO_BROADCAST, OptKind::Bool)),
        SocketOpt::Debug => Some((libc::SOL_SOCKET, libc::SO_DEBUG, OptKind::Bool)),
        SocketOpt::DontRoute => Some((libc::SOL_SOCKET, libc::SO_DONTROUTE, OptKind::Bool)),
        SocketOpt::KeepAlive => Some((libc::SOL_SOCKET, libc::SO_KEEPALIVE, OptKind::Bool)),
        SocketOpt::Linger => Some((libc::SOL_SOCKET, libc::SO_LINGER, OptKind::Linger)),
        SocketOpt::Multicast => Some((
            libc::IPPROTO_IP,
            libc::IP_ADD_MEMBERSHIP,
            OptKind::Multicast,
        )),
        SocketOpt::MulticastLoopback => {
            Some((libc::IPPROTO_IP, libc::IP_MULTICAST_LOOP, OptKind::Bool))
        }
        SocketOpt::MulticastTtl => Some((libc::IPPROTO_IP, libc::IP_MULTICAST_TTL, OptKind::Int)),
        SocketOpt::NoDelay => Some((libc::IPPROTO_TCP, libc::TCP_NODELAY, OptKind::Bool)),
        SocketOpt::OobInline => Some((libc::SOL_SOCKET, libc::SO_OOBINLINE, OptKind::Bool)),
        SocketOpt::RecvBuf => Some((libc::SOL_SOCKET, libc::SO_RCVBUF, OptKind::Int)),
        SocketOpt::RecvLowMark => Some((libc::SOL_SOCKET, libc::SO_RCVLOWAT, OptKind::Int)),
        SocketOpt::RecvTimeout => {
            Some((libc::SOL_SOCKET, libc::SO_RCVTIMEO, OptKind::DurationTimeval))
        }
        SocketOpt::ReuseAddress => Some((libc::SOL_SOCKET, libc::SO_REUSEADDR, OptKind::Bool)),
        SocketOpt::ReusePort => Some((libc::SOL_SOCKET, libc::SO_REUSEPORT, OptKind::Bool)),
        SocketOpt::SendBuf => Some((libc::SOL_SOCKET, libc::SO_SNDBUF, OptKind::Int)),
        SocketOpt::SendLowMark => Some((libc::SOL_SOCKET, libc::SO_SNDLOWAT, OptKind::Int)),
        SocketOpt::SendTimeout => {
            Some((libc::SOL_SOCKET, libc::SO_SNDTIMEO, OptKind::DurationTimeval))
        }
        SocketOpt::SocketError => Some((libc::SOL_SOCKET, libc::SO_ERROR, OptKind::Int)),
        #[cfg(any(target_os = "macos", target_os = "ios"))]
        SocketOpt::TcpKeepAlive => {
            Some((libc::IPPROTO_TCP, libc::TCP_KEEPALIVE, OptKind::DurationSecs))
        }
        #[cfg(not(any(target_os = "macos", target_os = "ios")))]
        SocketOpt::TcpKeepAlive => None,
        SocketOpt::TcpKeepCount => Some((libc::IPPROTO_TCP, libc::TCP_KEEPCNT, OptKind::Int)),
        #[cfg(any(target_os = "linux", target_os = "android"))]
        SocketOpt::TcpKeepIdle => {
            Some((libc::IPPROTO_TCP, libc::TCP_KEEPIDLE, OptKind::DurationSecs))
        }
        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        SocketOpt::TcpKeepIdle => None,
        SocketOpt::TcpKeepInterval => {
            Some((libc::IPPROTO_TCP, libc::TCP_KEEPINTVL, OptKind::DurationSecs))
        }
        SocketOpt::TimeToLive => Some((libc::IPPROTO_IP, libc::IP_TTL, OptKind::Int)),
        SocketOpt::Type => Some((libc::SOL_SOCKET, libc::SO_TYPE, OptKind::Int)),
    }
}

fn unsupported(opt: SocketOpt) -> Failure {
    Failure::new(ErrorKind::Unsupported)
        .with_context(format!("socket option '{:?}' is not supported on this platform", opt))
}

pub(crate) fn get_option(sock: Socket, opt: SocketOpt) -> Result<SocketOptionValue> {
    let (level, name, kind) = option_entry(opt).ok_or_else(|| unsupported(opt))?;

    unsafe {
        match kind {
            OptKind::Bool => {
                let mut value: c_int = 0;
                get_raw(sock, opt, level, name, &mut value)?;
                Ok(SocketOptionValue::Bool(value != 0))
            }
            OptKind::Int => {
                let mut value: c_int = 0;
                get_raw(sock, opt, level, name, &mut value)?;
                Ok(SocketOptionValue::Int(value))
            }
            OptKind::DurationTimeval => {
                let mut value: libc::timeval = mem::zeroed();
                get_raw(sock, opt, level, name, &mut value)?;
                Ok(SocketOptionValue::Duration(
                    Duration::new(value.tv_sec as u64, (value.tv_usec as u32) * 1000),
                ))
            }
            OptKind::DurationSecs => {
                let mut value: c_int = 0;
                get_raw(sock, opt, level, name, &mut value)?;
                Ok(SocketOptionValue::Duration(Duration::from_secs(
                    value as u64,
                )))
            }
            OptKind::Linger => {
                let mut value: libc::linger = mem::zeroed();
                get_raw(sock, opt, level, name, &mut value)?;
                let duration = if value.l_onoff != 0 {
                    Duration::from_secs(value.l_linger as u64)
                } else {
                    Duration::from_secs(0)
                };
                Ok(SocketOptionValue::Duration(duration))
            }
            OptKind::Multicast => Err(unsupported(opt)
                .with_context("multicast membership is write-only")),
        }
    }
}

pub(crate) fn set_option(sock: Socket, opt: SocketOpt, value: SocketOptionValue) -> Result<()> {
    let (level, name, kind) = option_entry(opt).ok_or_else(|| unsupported(opt))?;

    unsafe {
        match (kind, value) {
            (OptKind::Bool, SocketOptionValue::Bool(value)) => {
                let raw: c_int = if value { 1 } else { 0 };
                set_raw(sock, opt, level, name, &raw)
            }
            (OptKind::Int, SocketOptionValue::Int(value)) => {
                let raw: c_int = value;
                set_raw(sock, opt, level, name, &raw)
            }
            (OptKind::DurationTimeval, SocketOptionValue::Duration(value)) => {
                let raw = libc::timeval {
                    tv_sec: value.as_secs() as libc::time_t,
                    tv_usec: value.subsec_micros() as libc::suseconds_t,
                };
                set_raw(sock, opt, level, name, &raw)
            }
            (OptKind::DurationSecs, SocketOptionValue::Duration(value)) => {
                let raw: c_int = value.as_secs() as c_int;
                set_raw(sock, opt, level, name, &raw)
            }
            (OptKind::Linger, SocketOptionValue::Duration(value)) => {
                let raw = libc::linger {
                    l_onoff: if value.as_secs() > 0 { 1 } else { 0 },
                    l_linger: value.as_secs() as c_int,
                };
                set_raw(sock, opt, level, name, &raw)
            }
            (OptKind::Multicast, SocketOptionValue::Multicast(group)) => {
                let raw = libc::ip_mreq {
                    imr_multiaddr: libc::in_addr {
                        s_addr: u32::from_ne_bytes(group.address.octets()),
                    },
                    imr_interface: libc::in_addr {
                        s_addr: u32::from_ne_bytes(group.interface.octets()),
                    },
                };
                set_raw(sock, opt, level, name, &raw)
            }
            _ => Err(Failure::new(ErrorKind::InvalidArgument).with_context(format!(
                "socket option '{:?}' carries a different value type",
                opt
            ))),
        }
    }
}

unsafe fn get_raw<T>(
    sock: Socket,
    opt: SocketOpt,
    level: c_int,
    name: c_int,
    value: &mut T,
) -> Result<()> {
    let mut length = mem::size_of::<T>() as socklen_t;

    let result = libc::getsockopt(
        sock.raw(),
        level,
        name,
        value as *mut T as *mut c_void,
        &mut length,
    );

    if result < 0 {
        return Err(last_network_failure()
            .with_context(format!("failed to get socket option '{:?}' for '{}'", opt, sock)));
    }
    Ok(())
}

unsafe fn set_raw<T>(
    sock: Socket,
    opt: SocketOpt,
    level: c_int,
    name: c_int,
    value: &T,
) -> Result<()> {
    let result = libc::setsockopt(
        sock.raw(),
        level,
        name,
        value as *const T as *const c_void,
        mem::size_of::<T>() as socklen_t,
    );

    if result < 0 {
        return Err(last_network_failure()
            .with_context(format!("failed to set socket option '{:?}' for '{}'", opt, sock)));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Name resolution
// ---------------------------------------------------------------------------

fn address_info_flags_to_raw(flags: AddressInfoFlags) -> c_int {
    let mut raw = 0;

    if flags.contains(AddressInfoFlags::ADDRESS_CONFIG) {
        raw |= libc::AI_ADDRCONFIG;
    }
    if flags.contains(AddressInfoFlags::ADDRESS_MAPPED) {
        raw |= libc::AI_V4MAPPED;
    }
    if flags.contains(AddressInfoFlags::CANONICAL_NAME) {
        raw |= libc::AI_CANONNAME;
    }
    if flags.contains(AddressInfoFlags::NUMERIC_HOST) {
        raw |= libc::AI_NUMERICHOST;
    }
    if flags.contains(AddressInfoFlags::NUMERIC_SERVICE) {
        raw |= libc::AI_NUMERICSERV;
    }
    if flags.contains(AddressInfoFlags::PASSIVE) {
        raw |= libc::AI_PASSIVE;
    }

    raw
}

pub(crate) fn resolve(
    host: &str,
    service: Option<&str>,
    hints: Option<&AddressInfo>,
) -> Result<Vec<AddressInfo>> {
    let host = CString::new(host).map_err(|_| {
        Failure::new(ErrorKind::InvalidArgument).with_context("host contains a NUL byte")
    })?;
    let service = match service {
        Some(service) => Some(CString::new(service).map_err(|_| {
            Failure::new(ErrorKind::InvalidArgument).with_context("service contains a NUL byte")
        })?),
        None => None,
    };

    let mut raw_hints: libc::addrinfo = unsafe { mem::zeroed() };
    if let Some(hints) = hints {
        raw_hints.ai_flags = address_info_flags_to_raw(hints.flags);
        raw_hints.ai_family = family_to_raw(hints.family);
        raw_hints.ai_socktype = socket_type_to_raw(hints.socket_type);
        raw_hints.ai_protocol = protocol_to_raw(hints.protocol);
    }

    let mut list: *mut libc::addrinfo = ptr::null_mut();
    let result = unsafe {
        libc::getaddrinfo(
            host.as_ptr(),
            service.as_ref().map_or(ptr::null(), |s| s.as_ptr()),
            &raw_hints,
            &mut list,
        )
    };

    if result != 0 {
        let message = unsafe { CStr::from_ptr(libc::gai_strerror(result)) };
        return Err(Failure::with_code(ErrorKind::NotFound, result).with_context(format!(
            "failed to resolve '{}': {}",
            host.to_string_lossy(),
            message.to_string_lossy()
        )));
    }

    let mut entries = Vec::new();
    let mut cursor = list;

    while !cursor.is_null() {
        let info = unsafe { &*cursor };

        if !info.ai_addr.is_null() && info.ai_addrlen > 0 {
            let bytes = unsafe {
                std::slice::from_raw_parts(info.ai_addr as *const u8, info.ai_addrlen as usize)
            };
            if let Ok(address) = SocketAddress::from_sockaddr(bytes) {
                entries.push(AddressInfo {
                    flags: AddressInfoFlags::empty(),
                    family: family_from_raw(info.ai_family),
                    socket_type: socket_type_from_raw(info.ai_socktype),
                    protocol: protocol_from_raw(info.ai_protocol),
                    address,
                });
            }
        }

        cursor = info.ai_next;
    }

    unsafe { libc::freeaddrinfo(list) };

    if entries.is_empty() {
        return Err(Failure::new(ErrorKind::NotFound)
            .with_context(format!("no usable addresses for '{}'", host.to_string_lossy())));
    }

    Ok(entries)
}
