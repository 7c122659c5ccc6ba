#[cfg(unix)]
#[path = "network/sys_posix.rs"]
pub(crate) mod sys;

#[cfg(windows)]
#[path = "network/sys_windows.rs"]
pub(crate) mod sys;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bitflags::bitflags;
use serde::Serialize;

use crate::address::{AddressFamily, MulticastGroup, SocketAddress};
use crate::error::{ErrorKind, Failure, Result};

/// Raw kernel socket handle.
#[cfg(unix)]
pub type RawSocketHandle = i32;

#[cfg(windows)]
pub type RawSocketHandle = usize;

/// Opaque identifier for a kernel socket.
///
/// Whoever created the handle (via `create_socket` or `accept`) owns it
/// until `close`; closing twice is a programming error.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct Socket(RawSocketHandle);

#[cfg(unix)]
pub const INVALID_SOCKET: Socket = Socket(-1);

#[cfg(windows)]
pub const INVALID_SOCKET: Socket = Socket(usize::MAX);

impl Socket {
    pub(crate) fn from_raw(raw: RawSocketHandle) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> RawSocketHandle {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        *self != INVALID_SOCKET
    }
}

impl Default for Socket {
    fn default() -> Self {
        INVALID_SOCKET
    }
}

impl fmt::Display for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum SocketProtocol {
    None,
    Icmp,
    Ip,
    Raw,
    Tcp,
    Udp,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum SocketType {
    None,
    Stream,
    Datagram,
    Raw,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum SocketShutdownMode {
    Read,
    Write,
    Both,
}

bitflags! {
    /// Readiness interest and readiness report bits.
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
    pub struct SocketOperation: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const ERROR = 1 << 2;

        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
        const ACCEPT = Self::READ.bits() | Self::ERROR.bits();
        const ALL = Self::READ.bits() | Self::WRITE.bits() | Self::ERROR.bits();
    }
}

bitflags! {
    /// Flags forwarded to `recv`/`send`.
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
    pub struct MessageOption: u8 {
        const CONFIRM = 1 << 0;
        const NO_SIGNAL = 1 << 1;
        const OUT_OF_BAND = 1 << 2;
        const PEEK = 1 << 3;
    }
}

bitflags! {
    /// Hints for name resolution.
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
    pub struct AddressInfoFlags: u16 {
        const ADDRESS_CONFIG = 1 << 0;
        const ADDRESS_MAPPED = 1 << 1;
        const CANONICAL_NAME = 1 << 2;
        const NUMERIC_HOST = 1 << 3;
        const NUMERIC_SERVICE = 1 << 4;
        const PASSIVE = 1 << 5;
    }
}

/// Family/protocol/type triple used to create sockets.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SocketConfig {
    pub family: AddressFamily,
    pub protocol: SocketProtocol,
    pub socket_type: SocketType,
}

impl SocketConfig {
    pub const fn new(
        family: AddressFamily,
        protocol: SocketProtocol,
        socket_type: SocketType,
    ) -> Self {
        Self {
            family,
            protocol,
            socket_type,
        }
    }
}

pub const TCP_V4: SocketConfig =
    SocketConfig::new(AddressFamily::Inet4, SocketProtocol::Tcp, SocketType::Stream);
pub const TCP_V6: SocketConfig =
    SocketConfig::new(AddressFamily::Inet6, SocketProtocol::Tcp, SocketType::Stream);
pub const UDP_V4: SocketConfig = SocketConfig::new(
    AddressFamily::Inet4,
    SocketProtocol::Udp,
    SocketType::Datagram,
);
pub const UDP_V6: SocketConfig = SocketConfig::new(
    AddressFamily::Inet6,
    SocketProtocol::Udp,
    SocketType::Datagram,
);

/// Closed set of socket option tags. Each tag has a declared value type;
/// see [`options`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum SocketOpt {
    Broadcast,
    Debug,
    DontRoute,
    KeepAlive,
    Linger,
    Multicast,
    MulticastLoopback,
    MulticastTtl,
    NoDelay,
    OobInline,
    RecvBuf,
    RecvLowMark,
    RecvTimeout,
    ReuseAddress,
    ReusePort,
    SendBuf,
    SendLowMark,
    SendTimeout,
    SocketError,
    TcpKeepAlive,
    TcpKeepCount,
    TcpKeepIdle,
    TcpKeepInterval,
    TimeToLive,
    Type,
}

/// Value carried by a socket option, dispatched by the tag's declared type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SocketOptionValue {
    Bool(bool),
    Int(i32),
    Duration(Duration),
    Multicast(MulticastGroup),
}

/// Conversion between a typed option value and the tagged carrier.
pub trait OptionValue: Sized {
    fn into_value(self) -> SocketOptionValue;
    fn from_value(value: SocketOptionValue) -> Option<Self>;
}

impl OptionValue for bool {
    fn into_value(self) -> SocketOptionValue {
        SocketOptionValue::Bool(self)
    }

    fn from_value(value: SocketOptionValue) -> Option<Self> {
        match value {
            SocketOptionValue::Bool(v) => Some(v),
            _ => None,
        }
    }
}

impl OptionValue for i32 {
    fn into_value(self) -> SocketOptionValue {
        SocketOptionValue::Int(self)
    }

    fn from_value(value: SocketOptionValue) -> Option<Self> {
        match value {
            SocketOptionValue::Int(v) => Some(v),
            _ => None,
        }
    }
}

impl OptionValue for Duration {
    fn into_value(self) -> SocketOptionValue {
        SocketOptionValue::Duration(self)
    }

    fn from_value(value: SocketOptionValue) -> Option<Self> {
        match value {
            SocketOptionValue::Duration(v) => Some(v),
            _ => None,
        }
    }
}

impl OptionValue for MulticastGroup {
    fn into_value(self) -> SocketOptionValue {
        SocketOptionValue::Multicast(self)
    }

    fn from_value(value: SocketOptionValue) -> Option<Self> {
        match value {
            SocketOptionValue::Multicast(v) => Some(v),
            _ => None,
        }
    }
}

/// A socket option tag with its declared value type.
pub trait SocketOptionTag {
    type Value: OptionValue;
    const OPT: SocketOpt;
}

/// Zero-sized tag types, one per entry in the [`SocketOpt`] table.
pub mod options {
    use super::{MulticastGroup, SocketOpt, SocketOptionTag};
    use std::time::Duration;

    macro_rules! option_tag {
        ($name:ident, $value:ty, $opt:ident) => {
            pub struct $name;

            impl SocketOptionTag for $name {
                type Value = $value;
                const OPT: SocketOpt = SocketOpt::$opt;
            }
        };
    }

    option_tag!(Broadcast, bool, Broadcast);
    option_tag!(Debug, bool, Debug);
    option_tag!(DontRoute, bool, DontRoute);
    option_tag!(KeepAlive, bool, KeepAlive);
    option_tag!(MulticastLoopback, bool, MulticastLoopback);
    option_tag!(NoDelay, bool, NoDelay);
    option_tag!(OobInline, bool, OobInline);
    option_tag!(ReuseAddress, bool, ReuseAddress);
    option_tag!(ReusePort, bool, ReusePort);

    option_tag!(Linger, Duration, Linger);
    option_tag!(RecvTimeout, Duration, RecvTimeout);
    option_tag!(SendTimeout, Duration, SendTimeout);
    option_tag!(TcpKeepAlive, Duration, TcpKeepAlive);
    option_tag!(TcpKeepIdle, Duration, TcpKeepIdle);
    option_tag!(TcpKeepInterval, Duration, TcpKeepInterval);

    option_tag!(MulticastTtl, i32, MulticastTtl);
    option_tag!(RecvBuf, i32, RecvBuf);
    option_tag!(RecvLowMark, i32, RecvLowMark);
    option_tag!(SendBuf, i32, SendBuf);
    option_tag!(SendLowMark, i32, SendLowMark);
    option_tag!(SocketError, i32, SocketError);
    option_tag!(TcpKeepCount, i32, TcpKeepCount);
    option_tag!(TimeToLive, i32, TimeToLive);
    option_tag!(Type, i32, Type);

    option_tag!(Multicast, MulticastGroup, Multicast);
}

/// Result of a successful `accept`.
#[derive(Clone, Copy, Debug)]
pub struct AcceptedSocket {
    pub sock: Socket,
    pub address: SocketAddress,
}

/// Result of a successful `recv_from`.
#[derive(Clone, Copy, Debug)]
pub struct RecvFromData {
    pub received: usize,
    pub address: SocketAddress,
}

/// One name-resolution entry.
#[derive(Clone, Copy, Debug)]
pub struct AddressInfo {
    pub flags: AddressInfoFlags,
    pub family: AddressFamily,
    pub socket_type: SocketType,
    pub protocol: SocketProtocol,
    pub address: SocketAddress,
}

impl AddressInfo {
    /// Hints entry with everything unspecified.
    pub fn hints() -> Self {
        Self {
            flags: AddressInfoFlags::empty(),
            family: AddressFamily::Unspecified,
            socket_type: SocketType::None,
            protocol: SocketProtocol::None,
            address: SocketAddress::inet(crate::address::InetAddress::ANY, 0),
        }
    }
}

/// Blocking socket facade: a thin, correct wrapper over the kernel's
/// sockets. All operations are synchronous and block unless the socket has
/// been made non-blocking with [`Network::set_blocking`].
pub struct Network {
    _private: (),
}

impl Network {
    /// Bring up the platform socket layer and hand out a shared facade.
    pub fn create() -> Result<Arc<Network>> {
        sys::startup()?;
        log::debug!("network facade started");
        Ok(Arc::new(Network { _private: () }))
    }

    pub fn create_socket(&self, config: SocketConfig) -> Result<Socket> {
        sys::create_socket(config.family, config.protocol, config.socket_type)
    }

    pub fn close(&self, sock: Socket) -> Result<()> {
        check_socket(sock)?;
        sys::close(sock)
    }

    pub fn bind(&self, sock: Socket, address: &SocketAddress) -> Result<()> {
        check_socket(sock)?;
        sys::bind(sock, address)
    }

    pub fn connect(&self, sock: Socket, address: &SocketAddress) -> Result<()> {
        check_socket(sock)?;
        sys::connect(sock, address)
    }

    pub fn listen(&self, sock: Socket, backlog: u32) -> Result<()> {
        check_socket(sock)?;
        sys::listen(sock, backlog)
    }

    pub fn accept(&self, sock: Socket) -> Result<AcceptedSocket> {
        check_socket(sock)?;
        sys::accept(sock)
    }

    pub fn recv(&self, sock: Socket, buffer: &mut [u8]) -> Result<usize> {
        self.recv_flags(sock, buffer, MessageOption::empty())
    }

    /// Stream sockets surface a zero-byte read as `Disconnected`; an empty
    /// datagram stays a success.
    pub fn recv_flags(
        &self,
        sock: Socket,
        buffer: &mut [u8],
        flags: MessageOption,
    ) -> Result<usize> {
        check_socket(sock)?;
        if buffer.is_empty() {
            return Ok(0);
        }

        let received = sys::recv(sock, buffer, flags)?;
        if received == 0 {
            if self.get_socket_type(sock)? == SocketType::Stream {
                return Err(Failure::new(ErrorKind::Disconnected)
                    .with_context(format!("stream socket '{}' closed by peer", sock)));
            }
        }
        Ok(received)
    }

    pub fn recv_from(&self, sock: Socket, buffer: &mut [u8]) -> Result<RecvFromData> {
        self.recv_from_flags(sock, buffer, MessageOption::empty())
    }

    pub fn recv_from_flags(
        &self,
        sock: Socket,
        buffer: &mut [u8],
        flags: MessageOption,
    ) -> Result<RecvFromData> {
        check_socket(sock)?;
        sys::recv_from(sock, buffer, flags)
    }

    pub fn send(&self, sock: Socket, buffer: &[u8]) -> Result<usize> {
        self.send_flags(sock, buffer, MessageOption::empty())
    }

    pub fn send_flags(&self, sock: Socket, buffer: &[u8], flags: MessageOption) -> Result<usize> {
        check_socket(sock)?;
        if buffer.is_empty() {
            return Ok(0);
        }
        sys::send(sock, buffer, flags)
    }

    pub fn send_to(&self, sock: Socket, address: &SocketAddress, buffer: &[u8]) -> Result<usize> {
        self.send_to_flags(sock, address, buffer, MessageOption::empty())
    }

    pub fn send_to_flags(
        &self,
        sock: Socket,
        address: &SocketAddress,
        buffer: &[u8],
        flags: MessageOption,
    ) -> Result<usize> {
        check_socket(sock)?;
        sys::send_to(sock, address, buffer, flags)
    }

    pub fn get_sock_name(&self, sock: Socket) -> Result<SocketAddress> {
        check_socket(sock)?;
        sys::get_sock_name(sock)
    }

    pub fn get_peer_name(&self, sock: Socket) -> Result<SocketAddress> {
        check_socket(sock)?;
        sys::get_peer_name(sock)
    }

    pub fn set_blocking(&self, sock: Socket, blocking: bool) -> Result<()> {
        check_socket(sock)?;
        sys::set_blocking(sock, blocking)
    }

    pub fn shutdown(&self, sock: Socket, mode: SocketShutdownMode) -> Result<()> {
        check_socket(sock)?;
        sys::shutdown(sock, mode)
    }

    /// Read a socket option through its typed tag. A tag the platform does
    /// not implement fails with `Unsupported`.
    pub fn get_socket_option<T: SocketOptionTag>(&self, sock: Socket) -> Result<T::Value> {
        check_socket(sock)?;
        let value = sys::get_option(sock, T::OPT)?;
        T::Value::from_value(value).ok_or_else(|| {
            Failure::new(ErrorKind::InvalidArgument)
                .with_context(format!("socket option '{:?}' carries a different value type", T::OPT))
        })
    }

    /// Write a socket option through its typed tag.
    pub fn set_socket_option<T: SocketOptionTag>(
        &self,
        sock: Socket,
        value: T::Value,
    ) -> Result<()> {
        check_socket(sock)?;
        sys::set_option(sock, T::OPT, value.into_value())
    }

    pub fn get_socket_type(&self, sock: Socket) -> Result<SocketType> {
        let raw = self
            .get_socket_option::<options::Type>(sock)
            .map_err(|e| e.with_context(format!("failed to query socket type for '{}'", sock)))?;
        Ok(sys::socket_type_from_raw(raw))
    }

    /// One pass through the system resolver; no caching, no retry policy.
    pub fn resolve(
        &self,
        host: &str,
        service: Option<&str>,
        hints: Option<&AddressInfo>,
    ) -> Result<Vec<AddressInfo>> {
        sys::resolve(host, service, hints)
    }
}

fn check_socket(sock: Socket) -> Result<()> {
    if !sock.is_valid() {
        return Err(Failure::new(ErrorKind::InvalidArgument).with_context("invalid socket"));
    }
    Ok(())
}
