use std::ffi::CString;
use std::mem;
use std::ptr;
use std::sync::Once;
use std::time::Duration;

use winapi::ctypes::{c_char, c_int, c_void};
use winapi::shared::ws2def::{AF_INET, AF_INET6, AF_UNSPEC, SOCKADDR};
use winapi::um::winsock2 as ws;

use crate::address::{AddressFamily, SocketAddress, SOCKADDR_STORAGE_SIZE};
use crate::error::{ErrorKind, Failure, Result};
use crate::network::{
    AcceptedSocket, AddressInfo, AddressInfoFlags, MessageOption, RecvFromData, Socket,
    SocketOpt, SocketOptionValue, SocketProtocol, SocketShutdownMode, SocketType,
};

const SOCKET_ERROR: c_int = ws::SOCKET_ERROR;

// WinSock constants that winapi scatters across modules or omits.
const SOL_SOCKET: c_int = 0xffff;
const SO_BROADCAST: c_int = 0x0020;
const SO_DEBUG: c_int = 0x0001;
const SO_DONTROUTE: c_int = 0x0010;
const SO_KEEPALIVE: c_int = 0x0008;
const SO_LINGER: c_int = 0x0080;
const SO_OOBINLINE: c_int = 0x0100;
const SO_RCVBUF: c_int = 0x1002;
const SO_RCVLOWAT: c_int = 0x1004;
const SO_RCVTIMEO: c_int = 0x1006;
const SO_REUSEADDR: c_int = 0x0004;
const SO_SNDBUF: c_int = 0x1001;
const SO_SNDLOWAT: c_int = 0x1003;
const SO_SNDTIMEO: c_int = 0x1005;
const SO_ERROR: c_int = 0x1007;
const SO_TYPE: c_int = 0x1008;

const IPPROTO_IP: c_int = 0;
const IPPROTO_ICMP: c_int = 1;
const IPPROTO_TCP: c_int = 6;
const IPPROTO_UDP: c_int = 17;
const IPPROTO_RAW: c_int = 255;

const IP_MULTICAST_TTL: c_int = 10;
const IP_MULTICAST_LOOP: c_int = 11;
const IP_ADD_MEMBERSHIP: c_int = 12;
const IP_TTL: c_int = 4;

const TCP_NODELAY: c_int = 0x0001;
const TCP_KEEPIDLE: c_int = 3;
const TCP_KEEPCNT: c_int = 16;
const TCP_KEEPINTVL: c_int = 17;

const SOCK_STREAM: c_int = 1;
const SOCK_DGRAM: c_int = 2;
const SOCK_RAW: c_int = 3;

const MSG_OOB: c_int = 0x1;
const MSG_PEEK: c_int = 0x2;

const SD_RECEIVE: c_int = 0;
const SD_SEND: c_int = 1;
const SD_BOTH: c_int = 2;

const FIONBIO: i32 = 0x8004667e_u32 as i32;

#[repr(C)]
struct InAddr {
    s_addr: u32,
}

#[repr(C)]
struct IpMreq {
    imr_multiaddr: InAddr,
    imr_interface: InAddr,
}

#[repr(C)]
struct LingerOpt {
    l_onoff: u16,
    l_linger: u16,
}

pub(crate) fn startup() -> Result<()> {
    static INIT: Once = Once::new();

    INIT.call_once(|| unsafe {
        let mut data: ws::WSADATA = mem::zeroed();
        let result = ws::WSAStartup(0x202, &mut data);
        assert_eq!(result, 0, "WSAStartup failed with {}", result);
    });

    Ok(())
}

pub(crate) fn last_network_failure() -> Failure {
    Failure::last_os_error()
}

fn family_to_raw(family: AddressFamily) -> c_int {
    match family {
        AddressFamily::Unspecified => AF_UNSPEC,
        AddressFamily::Inet4 => AF_INET,
        AddressFamily::Inet6 => AF_INET6,
        AddressFamily::Unix => AF_UNSPEC,
    }
}

fn family_from_raw(family: c_int) -> AddressFamily {
    match family {
        AF_INET => AddressFamily::Inet4,
        AF_INET6 => AddressFamily::Inet6,
        _ => AddressFamily::Unspecified,
    }
}

fn socket_type_to_raw(socket_type: SocketType) -> c_int {
    match socket_type {
        SocketType::None => 0,
        SocketType::Stream => SOCK_STREAM,
        SocketType::Datagram => SOCK_DGRAM,
        SocketType::Raw => SOCK_RAW,
    }
}

pub(crate) fn socket_type_from_raw(socket_type: i32) -> SocketType {
    match socket_type {
        SOCK_STREAM => SocketType::Stream,
        SOCK_DGRAM => SocketType::Datagram,
        SOCK_RAW => SocketType::Raw,
        _ => SocketType::None,
    }
}

fn protocol_to_raw(protocol: SocketProtocol) -> c_int {
    match protocol {
        SocketProtocol::None => 0,
        SocketProtocol::Icmp => IPPROTO_ICMP,
        SocketProtocol::Ip => IPPROTO_IP,
        SocketProtocol::Raw => IPPROTO_RAW,
        SocketProtocol::Tcp => IPPROTO_TCP,
        SocketProtocol::Udp => IPPROTO_UDP,
    }
}

fn protocol_from_raw(protocol: c_int) -> SocketProtocol {
    match protocol {
        IPPROTO_ICMP => SocketProtocol::Icmp,
        IPPROTO_TCP => SocketProtocol::Tcp,
        IPPROTO_UDP => SocketProtocol::Udp,
        IPPROTO_RAW => SocketProtocol::Raw,
        _ => SocketProtocol::None,
    }
}

fn message_flags_to_raw(flags: MessageOption) -> c_int {
    let mut raw = 0;

    if flags.contains(MessageOption::OUT_OF_BAND) {
        raw |= MSG_OOB;
    }
    if flags.contains(MessageOption::PEEK) {
        raw |= MSG_PEEK;
    }

    raw
}

pub(crate) fn create_socket(
    family: AddressFamily,
    protocol: SocketProtocol,
    socket_type: SocketType,
) -> Result<Socket> {
    startup()?;

    if family == AddressFamily::Unix {
        return Err(Failure::new(ErrorKind::Unsupported)
            .with_context("unix domain sockets are not supported on this platform"));
    }

    let raw = unsafe {
        ws::socket(
            family_to_raw(family),
            socket_type_to_raw(socket_type),
            protocol_to_raw(protocol),
        )
    };

    if raw == ws::INVALID_SOCKET {
        return Err(last_network_failure().with_context(format!(
            "failed to create socket (family={},protocol={:?},type={:?})",
            family, protocol, socket_type
        )));
    }

    Ok(Socket::from_raw(raw))
}

pub(crate) fn close(sock: Socket) -> Result<()> {
    if unsafe { ws::closesocket(sock.raw()) } == SOCKET_ERROR {
        return Err(last_network_failure()
            .with_context(format!("failed to close socket '{}'", sock)));
    }
    Ok(())
}

pub(crate) fn bind(sock: Socket, address: &SocketAddress) -> Result<()> {
    let mut buffer = [0u8; SOCKADDR_STORAGE_SIZE];
    let length = address.to_sockaddr(&mut buffer)?;

    let result = unsafe {
        ws::bind(
            sock.raw(),
            buffer.as_ptr() as *const SOCKADDR,
            length as c_int,
        )
    };

    if result == SOCKET_ERROR {
        return Err(last_network_failure()
            .with_context(format!("failed to bind socket '{}' to '{}'", sock, address)));
    }
    Ok(())
}

pub(crate) fn connect(sock: Socket, address: &SocketAddress) -> Result<()> {
    let mut buffer = [0u8; SOCKADDR_STORAGE_SIZE];
    let length = address.to_sockaddr(&mut buffer)?;

    let result = unsafe {
        ws::connect(
            sock.raw(),
            buffer.as_ptr() as *const SOCKADDR,
            length as c_int,
        )
    };

    if result == SOCKET_ERROR {
        return Err(last_network_failure()
            .with_context(format!("failed to connect socket '{}' to '{}'", sock, address)));
    }
    Ok(())
}

pub(crate) fn listen(sock: Socket, backlog: u32) -> Result<()> {
    if unsafe { ws::listen(sock.raw(), backlog as c_int) } == SOCKET_ERROR {
        return Err(last_network_failure()
            .with_context(format!("failed to listen on '{}' (backlog={})", sock, backlog)));
    }
    Ok(())
}

pub(crate) fn accept(sock: Socket) -> Result<AcceptedSocket> {
    let mut buffer = [0u8; SOCKADDR_STORAGE_SIZE];
    let mut length = buffer.len() as c_int;

    let raw = unsafe {
        ws::accept(
            sock.raw(),
            buffer.as_mut_ptr() as *mut SOCKADDR,
            &mut length,
        )
    };

    if raw == ws::INVALID_SOCKET {
        return Err(last_network_failure()
            .with_context(format!("failed to accept() on '{}'", sock)));
    }

    let address = SocketAddress::from_sockaddr(&buffer[..length.max(4) as usize])
        .unwrap_or_else(|_| SocketAddress::inet(crate::address::InetAddress::ANY, 0));

    Ok(AcceptedSocket {
        sock: Socket::from_raw(raw),
        address,
    })
}

pub(crate) fn recv(sock: Socket, buffer: &mut [u8], flags: MessageOption) -> Result<usize> {
    let received = unsafe {
        ws::recv(
            sock.raw(),
            buffer.as_mut_ptr() as *mut c_char,
            buffer.len() as c_int,
            message_flags_to_raw(flags),
        )
    };

    if received == SOCKET_ERROR {
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
    let mut addr = [0u8; SOCKADDR_STORAGE_SIZE];
    let mut length = addr.len() as c_int;

    let received = unsafe {
        ws::recvfrom(
            sock.raw(),
            buffer.as_mut_ptr() as *mut c_char,
            buffer.len() as c_int,
            message_flags_to_raw(flags),
            addr.as_mut_ptr() as *mut SOCKADDR,
            &mut length,
        )
    };

    if received == SOCKET_ERROR {
        return Err(last_network_failure().with_context(format!(
            "failed recvfrom() on '{}' for '{}' bytes",
            sock,
            buffer.len()
        )));
    }

    let address = SocketAddress::from_sockaddr(&addr[..length.max(4) as usize])
        .unwrap_or_else(|_| SocketAddress::inet(crate::address::InetAddress::ANY, 0));

    Ok(RecvFromData {
        received: received as usize,
        address,
    })
}

pub(crate) fn send(sock: Socket, buffer: &[u8], flags: MessageOption) -> Result<usize> {
    let sent = unsafe {
        ws::send(
            sock.raw(),
            buffer.as_ptr() as *const c_char,
            buffer.len() as c_int,
            message_flags_to_raw(flags),
        )
    };

    if sent == SOCKET_ERROR {
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
        ws::sendto(
            sock.raw(),
            buffer.as_ptr() as *const c_char,
            buffer.len() as c_int,
            message_flags_to_raw(flags),
            addr.as_ptr() as *const SOCKADDR,
            length as c_int,
        )
    };

    if sent == SOCKET_ERROR {
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
    let mut buffer = [0u8; SOCKADDR_STORAGE_SIZE];
    let mut length = buffer.len() as c_int;

    let result = unsafe {
        ws::getsockname(
            sock.raw(),
            buffer.as_mut_ptr() as *mut SOCKADDR,
            &mut length,
        )
    };

    if result == SOCKET_ERROR {
        return Err(last_network_failure()
            .with_context(format!("failed to get socket name for '{}'", sock)));
    }

    SocketAddress::from_sockaddr(&buffer[..length.max(4) as usize])
}

pub(crate) fn get_peer_name(sock: Socket) -> Result<SocketAddress> {
    let mut buffer = [0u8; SOCKADDR_STORAGE_SIZE];
    let mut length = buffer.len() as c_int;

    let result = unsafe {
        ws::getpeername(
            sock.raw(),
            buffer.as_mut_ptr() as *mut SOCKADDR,
            &mut length,
        )
    };

    if result == SOCKET_ERROR {
        return Err(last_network_failure()
            .with_context(format!("failed to get peer name for '{}'", sock)));
    }

    SocketAddress::from_sockaddr(&buffer[..length.max(4) as usize])
}

pub(crate) fn set_blocking(sock: Socket, blocking: bool) -> Result<()> {
    let mut nonblocking: u32 = if blocking { 0 } else { 1 };

    let result = unsafe { ws::ioctlsocket(sock.raw(), FIONBIO, &mut nonblocking) };

    if result == SOCKET_ERROR {
        return Err(last_network_failure()
            .with_context(format!("failed ioctlsocket FIONBIO for '{}'", sock)));
    }
    Ok(())
}

pub(crate) fn shutdown(sock: Socket, mode: SocketShutdownMode) -> Result<()> {
    let how = match mode {
        SocketShutdownMode::Read => SD_RECEIVE,
        SocketShutdownMode::Write => SD_SEND,
        SocketShutdownMode::Both => SD_BOTH,
    };

    if unsafe { ws::shutdown(sock.raw(), how) } == SOCKET_ERROR {
        return Err(last_network_failure()
            .with_context(format!("failed to shutdown() socket '{}' ({:?})", sock, mode)));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Socket options
// ---------------------------------------------------------------------------

enum OptKind {
    Bool,
    Int,
    DurationMillis,
    DurationSecs,
    Linger,
    Multicast,
}

fn option_entry(opt: SocketOpt) -> Option<(c_int, c_int, OptKind)> {
    match opt {
        SocketOpt::Broadcast => Some((SOL_SOCKET, SO_BROADCAST, OptKind::Bool)),
        SocketOpt::Debug => Some((SOL_SOCKET, SO_DEBUG, OptKind::Bool)),
        SocketOpt::DontRoute => Some((SOL_SOCKET, SO_DONTROUTE, OptKind::Bool)),
        SocketOpt::KeepAlive => Some((SOL_SOCKET, SO_KEEPALIVE, OptKind::Bool)),
        SocketOpt::Linger => Some((SOL_SOCKET, SO_LINGER, OptKind::Linger)),
        SocketOpt::Multicast => Some((IPPROTO_IP, IP_ADD_MEMBERSHIP, OptKind::Multicast)),
        SocketOpt::MulticastLoopback => Some((IPPROTO_IP, IP_MULTICAST_LOOP, OptKind::Bool)),
        SocketOpt::MulticastTtl => Some((IPPROTO_IP, IP_MULTICAST_TTL, OptKind::Int)),
        SocketOpt::NoDelay => Some((IPPROTO_TCP, TCP_NODELAY, OptKind::Bool)),
        SocketOpt::OobInline => Some((SOL_SOCKET, SO_OOBINLINE, OptKind::Bool)),
        SocketOpt::RecvBuf => Some((SOL_SOCKET, SO_RCVBUF, OptKind::Int)),
        SocketOpt::RecvLowMark => Some((SOL_SOCKET, SO_RCVLOWAT, OptKind::Int)),
        SocketOpt::RecvTimeout => Some((SOL_SOCKET, SO_RCVTIMEO, OptKind::DurationMillis)),
        SocketOpt::ReuseAddress => Some((SOL_SOCKET, SO_REUSEADDR, OptKind::Bool)),
        SocketOpt::ReusePort => None,
        SocketOpt::SendBuf => Some((SOL_SOCKET, SO_SNDBUF, OptKind::Int)),
        SocketOpt::SendLowMark => Some((SOL_SOCKET, SO_SNDLOWAT, OptKind::Int)),
        SocketOpt::SendTimeout => Some((SOL_SOCKET, SO_SNDTIMEO, OptKind::DurationMillis)),
        SocketOpt::SocketError => Some((SOL_SOCKET, SO_ERROR, OptKind::Int)),
        SocketOpt::TcpKeepAlive => None,
        SocketOpt::TcpKeepCount => Some((IPPROTO_TCP, TCP_KEEPCNT, OptKind::Int)),
        SocketOpt::TcpKeepIdle => Some((IPPROTO_TCP, TCP_KEEPIDLE, OptKind::DurationSecs)),
        SocketOpt::TcpKeepInterval => Some((IPPROTO_TCP, TCP_KEEPINTVL, OptKind::DurationSecs)),
        SocketOpt::TimeToLive => Some((IPPROTO_IP, IP_TTL, OptKind::Int)),
        SocketOpt::Type => Some((SOL_SOCKET, SO_TYPE, OptKind::Int)),
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
            OptKind::DurationMillis => {
                let mut value: u32 = 0;
                get_raw(sock, opt, level, name, &mut value)?;
                Ok(SocketOptionValue::Duration(Duration::from_millis(
                    u64::from(value),
                )))
            }
            OptKind::DurationSecs => {
                let mut value: c_int = 0;
                get_raw(sock, opt, level, name, &mut value)?;
                Ok(SocketOptionValue::Duration(Duration::from_secs(
                    value as u64,
                )))
            }
            OptKind::Linger => {
                let mut value: LingerOpt = mem::zeroed();
                get_raw(sock, opt, level, name, &mut value)?;
                let duration = if value.l_onoff != 0 {
                    Duration::from_secs(u64::from(value.l_linger))
                } else {
                    Duration::from_secs(0)
                };
                Ok(SocketOptionValue::Duration(duration))
            }
            OptKind::Multicast => Err(unsupported(opt)),
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
            (OptKind::DurationMillis, SocketOptionValue::Duration(value)) => {
                let raw: u32 = value.as_millis() as u32;
                set_raw(sock, opt, level, name, &raw)
            }
            (OptKind::DurationSecs, SocketOptionValue::Duration(value)) => {
                let raw: c_int = value.as_secs() as c_int;
                set_raw(sock, opt, level, name, &raw)
            }
            (OptKind::Linger, SocketOptionValue::Duration(value)) => {
                let raw = LingerOpt {
                    l_onoff: if value.as_secs() > 0 { 1 } else { 0 },
                    l_linger: value.as_secs() as u16,
                };
                set_raw(sock, opt, level, name, &raw)
            }
            (OptKind::Multicast, SocketOptionValue::Multicast(group)) => {
                let raw = IpMreq {
                    imr_multiaddr: InAddr {
                        s_addr: u32::from_ne_bytes(group.address.octets()),
                    },
                    imr_interface: InAddr {
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
    let mut length = mem::size_of::<T>() as c_int;

    let result = ws::getsockopt(
        sock.raw(),
        level,
        name,
        value as *mut T as *mut c_char,
        &mut length,
    );

    if result == SOCKET_ERROR {
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
    let result = ws::setsockopt(
        sock.raw(),
        level,
        name,
        value as *const T as *const c_char,
        mem::size_of::<T>() as c_int,
    );

    if result == SOCKET_ERROR {
        return Err(last_network_failure()
            .with_context(format!("failed to set socket option '{:?}' for '{}'", opt, sock)));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Name resolution
// ---------------------------------------------------------------------------

fn address_info_flags_to_raw(flags: AddressInfoFlags) -> c_int {
    const AI_PASSIVE: c_int = 0x0001;
    const AI_CANONNAME: c_int = 0x0002;
    const AI_NUMERICHOST: c_int = 0x0004;
    const AI_NUMERICSERV: c_int = 0x0008;
    const AI_ADDRCONFIG: c_int = 0x0400;
    const AI_V4MAPPED: c_int = 0x0800;

    let mut raw = 0;

    if flags.contains(AddressInfoFlags::ADDRESS_CONFIG) {
        raw |= AI_ADDRCONFIG;
    }
    if flags.contains(AddressInfoFlags::ADDRESS_MAPPED) {
        raw |= AI_V4MAPPED;
    }
    if flags.contains(AddressInfoFlags::CANONICAL_NAME) {
        raw |= AI_CANONNAME;
    }
    if flags.contains(AddressInfoFlags::NUMERIC_HOST) {
        raw |= AI_NUMERICHOST;
    }
    if flags.contains(AddressInfoFlags::NUMERIC_SERVICE) {
        raw |= AI_NUMERICSERV;
    }
    if flags.contains(AddressInfoFlags::PASSIVE) {
        raw |= AI_PASSIVE;
    }

    raw
}

pub(crate) fn resolve(
    host: &str,
    service: Option<&str>,
    hints: Option<&AddressInfo>,
) -> Result<Vec<AddressInfo>> {
    use winapi::um::ws2tcpip::{freeaddrinfo, getaddrinfo, ADDRINFOA};

    startup()?;

    let host = CString::new(host).map_err(|_| {
        Failure::new(ErrorKind::InvalidArgument).with_context("host contains a NUL byte")
    })?;
    let service = match service {
        Some(service) => Some(CString::new(service).map_err(|_| {
            Failure::new(ErrorKind::InvalidArgument).with_context("service contains a NUL byte")
        })?),
        None => None,
    };

    let mut raw_hints: ADDRINFOA = unsafe { mem::zeroed() };
    if let Some(hints) = hints {
        raw_hints.ai_flags = address_info_flags_to_raw(hints.flags);
        raw_hints.ai_family = family_to_raw(hints.family);
        raw_hints.ai_socktype = socket_type_to_raw(hints.socket_type);
        raw_hints.ai_protocol = protocol_to_raw(hints.protocol);
    }

    let mut list: *mut ADDRINFOA = ptr::null_mut();
    let result = unsafe {
        getaddrinfo(
            host.as_ptr(),
            service.as_ref().map_or(ptr::null(), |s| s.as_ptr()),
            &raw_hints,
            &mut list,
        )
    };

    if result != 0 {
        return Err(Failure::with_code(ErrorKind::NotFound, result).with_context(format!(
            "failed to resolve '{}'",
            host.to_string_lossy()
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

    unsafe { freeaddrinfo(list) };

    if entries.is_empty() {
        return Err(Failure::new(ErrorKind::NotFound)
            .with_context(format!("no usable addresses for '{}'", host.to_string_lossy())));
    }

    Ok(entries)
}
