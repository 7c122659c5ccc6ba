use std::cmp::Ordering;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{ErrorKind, Failure, Result};

/// Address family tag shared by socket addresses and the facade.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum AddressFamily {
    Unspecified,
    Inet4,
    Inet6,
    Unix,
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unspecified => "Unspecified",
            Self::Inet4 => "Inet4",
            Self::Inet6 => "Inet6",
            Self::Unix => "Unix",
        };
        write!(f, "{}", name)
    }
}

/// IPv4 address, exactly 4 bytes in network order.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct InetAddress([u8; 4]);

impl InetAddress {
    pub const SIZE: usize = 4;

    pub const ANY: InetAddress = InetAddress([0, 0, 0, 0]);
    pub const LOOPBACK: InetAddress = InetAddress([127, 0, 0, 1]);
    pub const BROADCAST: InetAddress = InetAddress([255, 255, 255, 255]);

    pub const fn new(octets: [u8; 4]) -> Self {
        Self(octets)
    }

    pub fn from_decimal(value: u32) -> Self {
        Self(value.to_be_bytes())
    }

    pub fn to_decimal(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub fn octets(&self) -> [u8; 4] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Loopback, RFC1918 and RFC3927 link-local ranges.
    pub fn is_private(&self) -> bool {
        match self.0 {
            [127, ..] => true,
            [10, ..] => true,
            [172, b, ..] => (16..=31).contains(&b),
            [192, 168, ..] => true,
            [169, 254, ..] => true,
            _ => false,
        }
    }

    /// IPv4-mapped IPv6 form `::ffff:a.b.c.d`. Empty maps to empty.
    pub fn as_v6(&self) -> Inet6Address {
        if self.is_empty() {
            return Inet6Address::default();
        }

        let mut bytes = [0u8; 16];
        bytes[10] = 0xff;
        bytes[11] = 0xff;
        bytes[12..].copy_from_slice(&self.0);
        Inet6Address(bytes)
    }
}

impl FromStr for InetAddress {
    type Err = Failure;

    fn from_str(s: &str) -> Result<Self> {
        let addr: Ipv4Addr = s.parse().map_err(|_| {
            Failure::new(ErrorKind::InvalidArgument)
                .with_context(format!("failed to convert '{}' to an inet address", s))
        })?;
        Ok(Self(addr.octets()))
    }
}

impl fmt::Display for InetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Ipv4Addr::from(self.0))
    }
}

impl From<Ipv4Addr> for InetAddress {
    fn from(addr: Ipv4Addr) -> Self {
        Self(addr.octets())
    }
}

impl From<InetAddress> for Ipv4Addr {
    fn from(addr: InetAddress) -> Self {
        Ipv4Addr::from(addr.0)
    }
}

impl Serialize for InetAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// IPv6 address, exactly 16 bytes in network order.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Inet6Address([u8; 16]);

impl Inet6Address {
    pub const SIZE: usize = 16;

    pub const LOOPBACK: Inet6Address =
        Inet6Address([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
    pub const LOOPBACK_MAPPED_V4: Inet6Address =
        Inet6Address([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 127, 0, 0, 1]);

    pub const fn new(octets: [u8; 16]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 16] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// True for `::ffff:a.b.c.d` forms: ten zero bytes, then `ff ff`.
    pub fn is_mapped_v4(&self) -> bool {
        if self.is_empty() {
            return false;
        }
        self.0[..10].iter().all(|&b| b == 0) && self.0[10] == 0xff && self.0[11] == 0xff
    }

    /// The embedded v4 address, or empty when this is not a mapped form.
    pub fn as_v4(&self) -> InetAddress {
        if !self.is_mapped_v4() {
            return InetAddress::default();
        }

        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.0[12..]);
        InetAddress(bytes)
    }
}

impl FromStr for Inet6Address {
    type Err = Failure;

    fn from_str(s: &str) -> Result<Self> {
        let addr: Ipv6Addr = s.parse().map_err(|_| {
            Failure::new(ErrorKind::InvalidArgument)
                .with_context(format!("failed to convert '{}' to an inet6 address", s))
        })?;
        Ok(Self(addr.octets()))
    }
}

impl fmt::Display for Inet6Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Ipv6Addr::from(self.0))
    }
}

impl From<Ipv6Addr> for Inet6Address {
    fn from(addr: Ipv6Addr) -> Self {
        Self(addr.octets())
    }
}

impl From<Inet6Address> for Ipv6Addr {
    fn from(addr: Inet6Address) -> Self {
        Ipv6Addr::from(addr.0)
    }
}

impl Serialize for Inet6Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// IPv4 multicast group membership: the group and the local interface.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct MulticastGroup {
    pub address: InetAddress,
    pub interface: InetAddress,
}

const UNIX_PATH_LENGTH: usize = 104;

/// Filesystem path of a unix-domain socket, at most 104 bytes, stored
/// NUL-terminated the way the kernel wants it.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct UnixPath {
    bytes: [u8; UNIX_PATH_LENGTH + 1],
}

impl UnixPath {
    pub const LENGTH: usize = UNIX_PATH_LENGTH;

    pub fn new(path: &str) -> Result<Self> {
        if path.len() > Self::LENGTH {
            return Err(Failure::new(ErrorKind::SizeExceeded)
                .with_context(format!("unix socket path exceeds {} bytes", Self::LENGTH)));
        }

        let mut bytes = [0u8; Self::LENGTH + 1];
        bytes[..path.len()].copy_from_slice(path.as_bytes());
        Ok(Self { bytes })
    }

    pub(crate) fn from_raw(raw: &[u8]) -> Self {
        let mut bytes = [0u8; Self::LENGTH + 1];
        let count = raw.len().min(Self::LENGTH);
        bytes[..count].copy_from_slice(&raw[..count]);
        Self { bytes }
    }

    /// Path bytes up to the terminating NUL.
    pub fn as_bytes(&self) -> &[u8] {
        let end = self
            .bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(Self::LENGTH);
        &self.bytes[..end]
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.bytes[0] == 0
    }
}

impl fmt::Debug for UnixPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnixPath({:?})", self.as_str())
    }
}

impl fmt::Display for UnixPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Socket address: the tagged union over the supported families.
///
/// Ports are host-order in the value and network-order in the kernel form.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SocketAddress {
    Inet {
        address: InetAddress,
        port: u16,
    },
    Inet6 {
        address: Inet6Address,
        port: u16,
        flow_info: u32,
        scope: u32,
    },
    Unix {
        path: UnixPath,
    },
}

impl SocketAddress {
    pub fn inet(address: InetAddress, port: u16) -> Self {
        Self::Inet { address, port }
    }

    pub fn inet6(address: Inet6Address, port: u16) -> Self {
        Self::Inet6 {
            address,
            port,
            flow_info: 0,
            scope: 0,
        }
    }

    pub fn unix(path: &str) -> Result<Self> {
        Ok(Self::Unix {
            path: UnixPath::new(path)?,
        })
    }

    pub fn family(&self) -> AddressFamily {
        match self {
            Self::Inet { .. } => AddressFamily::Inet4,
            Self::Inet6 { .. } => AddressFamily::Inet6,
            Self::Unix { .. } => AddressFamily::Unix,
        }
    }

    /// Port for the inet families, zero for unix addresses.
    pub fn port(&self) -> u16 {
        match self {
            Self::Inet { port, .. } => *port,
            Self::Inet6 { port, .. } => *port,
            Self::Unix { .. } => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Inet { address, port } => address.is_empty() && *port == 0,
            Self::Inet6 { address, port, .. } => address.is_empty() && *port == 0,
            Self::Unix { path } => path.is_empty(),
        }
    }

    /// Parse `a.b.c.d`, `a.b.c.d:port`, `[v6]:port`, bare `v6`, or a
    /// `unix://` URI. The host/port split happens on the last `:` outside
    /// brackets; a missing port means zero.
    pub fn from_string(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(Failure::new(ErrorKind::InvalidArgument).with_context("empty socket address"));
        }

        if let Some(path) = input.strip_prefix("unix://") {
            return Self::unix(path);
        }

        if let Some(rest) = input.strip_prefix('[') {
            // bracketed host of either inet family, optionally :port
            let close = rest.find(']').ok_or_else(|| {
                Failure::new(ErrorKind::InvalidArgument)
                    .with_context(format!("unterminated bracket in '{}'", input))
            })?;
            let host = &rest[..close];
            let port = match &rest[close + 1..] {
                "" => 0,
                tail => parse_port(tail.strip_prefix(':').ok_or_else(|| {
                    Failure::new(ErrorKind::InvalidArgument)
                        .with_context(format!("malformed address '{}'", input))
                })?)?,
            };
            return match parse_address(host)? {
                ParsedAddress::Inet4(address) => Ok(Self::inet(address, port)),
                ParsedAddress::Inet6(address) => Ok(Self::inet6(address, port)),
            };
        }

        // unbracketed: split on the last colon unless the host itself is a
        // bare v6 literal (more than one colon and no port separator)
        let (host, port) = match input.rfind(':') {
            Some(pos) if input[..pos].contains(':') => (input, 0),
            Some(pos) => (&input[..pos], parse_port(&input[pos + 1..])?),
            None => (input, 0),
        };

        match parse_address(host)? {
            ParsedAddress::Inet4(address) => Ok(Self::inet(address, port)),
            ParsedAddress::Inet6(address) => Ok(Self::inet6(address, port)),
        }
    }
}

fn parse_port(input: &str) -> Result<u16> {
    input.parse::<u16>().map_err(|_| {
        Failure::new(ErrorKind::InvalidArgument)
            .with_context(format!("invalid port number '{}'", input))
    })
}

impl fmt::Display for SocketAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inet { address, port } => write!(f, "[{}]:{}", address, port),
            Self::Inet6 { address, port, .. } => write!(f, "[{}]:{}", address, port),
            Self::Unix { path } => write!(f, "unix://{}", path),
        }
    }
}

impl PartialOrd for SocketAddress {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SocketAddress {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (
                Self::Inet { address, port },
                Self::Inet {
                    address: other_address,
                    port: other_port,
                },
            ) => address.cmp(other_address).then(port.cmp(other_port)),
            (
                Self::Inet6 { address, port, .. },
                Self::Inet6 {
                    address: other_address,
                    port: other_port,
                    ..
                },
            ) => address.cmp(other_address).then(port.cmp(other_port)),
            (Self::Unix { path }, Self::Unix { path: other_path }) => path.cmp(other_path),
            (a, b) => family_rank(a).cmp(&family_rank(b)),
        }
    }
}

fn family_rank(address: &SocketAddress) -> u8 {
    match address {
        SocketAddress::Inet { .. } => 0,
        SocketAddress::Inet6 { .. } => 1,
        SocketAddress::Unix { .. } => 2,
    }
}

impl Serialize for SocketAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of a one-pass address parse: v4 first, then v6.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParsedAddress {
    Inet4(InetAddress),
    Inet6(Inet6Address),
}

pub fn parse_address(input: &str) -> Result<ParsedAddress> {
    if let Ok(addr) = input.parse::<InetAddress>() {
        return Ok(ParsedAddress::Inet4(addr));
    }
    if let Ok(addr) = input.parse::<Inet6Address>() {
        return Ok(ParsedAddress::Inet6(addr));
    }
    Err(Failure::new(ErrorKind::InvalidArgument)
        .with_context(format!("unable to parse address '{}'", input)))
}

// ---------------------------------------------------------------------------
// Kernel sockaddr conversion
// ---------------------------------------------------------------------------

/// Size of the buffer needed to hold any supported `sockaddr_*` form.
#[cfg(unix)]
pub const SOCKADDR_STORAGE_SIZE: usize = std::mem::size_of::<libc::sockaddr_storage>();

#[cfg(windows)]
pub const SOCKADDR_STORAGE_SIZE: usize =
    std::mem::size_of::<winapi::shared::ws2def::SOCKADDR_STORAGE>();

#[cfg(unix)]
impl SocketAddress {
    /// Serialise into a caller-provided `sockaddr` buffer: writes the family
    /// tag, byte-swaps the port, copies the address bytes, and returns the
    /// byte length consumed.
    pub fn to_sockaddr(&self, buffer: &mut [u8]) -> Result<usize> {
        use std::mem::size_of;

        match self {
            Self::Inet { address, port } => {
                let length = size_of::<libc::sockaddr_in>();
                if buffer.len() < length {
                    return Err(Failure::new(ErrorKind::InvalidArgument)
                        .with_context("sockaddr buffer too small for an inet4 address"));
                }

                let mut raw: libc::sockaddr_in = unsafe { std::mem::zeroed() };
                raw.sin_family = libc::AF_INET as libc::sa_family_t;
                raw.sin_port = port.to_be();
                raw.sin_addr.s_addr = u32::from_ne_bytes(address.octets());

                copy_raw(&raw, &mut buffer[..length]);
                Ok(length)
            }
            Self::Inet6 {
                address,
                port,
                flow_info,
                scope,
            } => {
                let length = size_of::<libc::sockaddr_in6>();
                if buffer.len() < length {
                    return Err(Failure::new(ErrorKind::InvalidArgument)
                        .with_context("sockaddr buffer too small for an inet6 address"));
                }

                let mut raw: libc::sockaddr_in6 = unsafe { std::mem::zeroed() };
                raw.sin6_family = libc::AF_INET6 as libc::sa_family_t;
                raw.sin6_port = port.to_be();
                raw.sin6_flowinfo = flow_info.to_be();
                raw.sin6_scope_id = scope.to_be();
                raw.sin6_addr.s6_addr = address.octets();

                copy_raw(&raw, &mut buffer[..length]);
                Ok(length)
            }
            Self::Unix { path } => {
                let length = size_of::<libc::sockaddr_un>();
                if buffer.len() < length {
                    return Err(Failure::new(ErrorKind::InvalidArgument)
                        .with_context("sockaddr buffer too small for a unix address"));
                }

                let mut raw: libc::sockaddr_un = unsafe { std::mem::zeroed() };
                raw.sun_family = libc::AF_UNIX as libc::sa_family_t;
                let bytes = path.as_bytes();
                for (dst, src) in raw.sun_path.iter_mut().zip(bytes.iter()) {
                    *dst = *src as libc::c_char;
                }

                copy_raw(&raw, &mut buffer[..length]);
                Ok(length)
            }
        }
    }

    /// Deserialise from a kernel `sockaddr` buffer filled by the platform.
    pub fn from_sockaddr(buffer: &[u8]) -> Result<SocketAddress> {
        use std::mem::size_of;

        if buffer.len() < size_of::<libc::sa_family_t>() + 2 {
            return Err(Failure::new(ErrorKind::InvalidArgument)
                .with_context("sockaddr buffer too small to carry a family tag"));
        }

        // BSD-derived systems lead with a length byte; the family follows.
        #[cfg(any(
            target_os = "macos",
            target_os = "ios",
            target_os = "freebsd",
            target_os = "netbsd",
            target_os = "openbsd"
        ))]
        let family = i32::from(buffer[1]);
        #[cfg(not(any(
            target_os = "macos",
            target_os = "ios",
            target_os = "freebsd",
            target_os = "netbsd",
            target_os = "openbsd"
        )))]
        let family = i32::from(u16::from_ne_bytes([buffer[0], buffer[1]]));

        match family {
            libc::AF_INET => {
                if buffer.len() < size_of::<libc::sockaddr_in>() {
                    return Err(Failure::new(ErrorKind::InvalidArgument)
                        .with_context("truncated inet4 sockaddr"));
                }
                let raw: libc::sockaddr_in =
                    unsafe { std::ptr::read_unaligned(buffer.as_ptr() as *const _) };
                Ok(SocketAddress::Inet {
                    address: InetAddress::new(raw.sin_addr.s_addr.to_ne_bytes()),
                    port: u16::from_be(raw.sin_port),
                })
            }
            libc::AF_INET6 => {
                if buffer.len() < size_of::<libc::sockaddr_in6>() {
                    return Err(Failure::new(ErrorKind::InvalidArgument)
                        .with_context("truncated inet6 sockaddr"));
                }
                let raw: libc::sockaddr_in6 =
                    unsafe { std::ptr::read_unaligned(buffer.as_ptr() as *const _) };
                Ok(SocketAddress::Inet6 {
                    address: Inet6Address::new(raw.sin6_addr.s6_addr),
                    port: u16::from_be(raw.sin6_port),
                    flow_info: u32::from_be(raw.sin6_flowinfo),
                    scope: u32::from_be(raw.sin6_scope_id),
                })
            }
            libc::AF_UNIX => {
                let raw: libc::sockaddr_un =
                    unsafe { read_sockaddr_un(buffer) };
                let path: Vec<u8> = raw
                    .sun_path
                    .iter()
                    .take_while(|&&c| c != 0)
                    .map(|&c| c as u8)
                    .collect();
                Ok(SocketAddress::Unix {
                    path: UnixPath::from_raw(&path),
                })
            }
            other => Err(Failure::new(ErrorKind::InvalidArgument)
                .with_context(format!("unsupported address family {}", other))),
        }
    }
}

// The kernel may hand back fewer bytes than a full sockaddr_un (unnamed
// sockets); missing tail bytes read as zero.
#[cfg(unix)]
unsafe fn read_sockaddr_un(buffer: &[u8]) -> libc::sockaddr_un {
    let mut raw: libc::sockaddr_un = std::mem::zeroed();
    let count = buffer.len().min(std::mem::size_of::<libc::sockaddr_un>());
    std::ptr::copy_nonoverlapping(buffer.as_ptr(), &mut raw as *mut _ as *mut u8, count);
    raw
}

#[cfg(unix)]
fn copy_raw<T>(value: &T, buffer: &mut [u8]) {
    let bytes = unsafe {
        std::slice::from_raw_parts(value as *const T as *const u8, std::mem::size_of::<T>())
    };
    buffer.copy_from_slice(bytes);
}

#[cfg(windows)]
impl SocketAddress {
    pub fn to_sockaddr(&self, buffer: &mut [u8]) -> Result<usize> {
        use std::mem::size_of;
        use winapi::shared::ws2def::{AF_INET, AF_INET6, SOCKADDR_IN};
        use winapi::shared::ws2ipdef::SOCKADDR_IN6_LH;

        match self {
            Self::Inet { address, port } => {
                let length = size_of::<SOCKADDR_IN>();
                if buffer.len() < length {
                    return Err(Failure::new(ErrorKind::InvalidArgument)
                        .with_context("sockaddr buffer too small for an inet4 address"));
                }

                let mut raw: SOCKADDR_IN = unsafe { std::mem::zeroed() };
                raw.sin_family = AF_INET as u16;
                raw.sin_port = port.to_be();
                unsafe {
                    *raw.sin_addr.S_un.S_addr_mut() = u32::from_ne_bytes(address.octets());
                }

                let bytes = unsafe {
                    std::slice::from_raw_parts(&raw as *const _ as *const u8, length)
                };
                buffer[..length].copy_from_slice(bytes);
                Ok(length)
            }
            Self::Inet6 {
                address,
                port,
                flow_info,
                scope,
            } => {
                let length = size_of::<SOCKADDR_IN6_LH>();
                if buffer.len() < length {
                    return Err(Failure::new(ErrorKind::InvalidArgument)
                        .with_context("sockaddr buffer too small for an inet6 address"));
                }

                let mut raw: SOCKADDR_IN6_LH = unsafe { std::mem::zeroed() };
                raw.sin6_family = AF_INET6 as u16;
                raw.sin6_port = port.to_be();
                raw.sin6_flowinfo = flow_info.to_be();
                unsafe {
                    *raw.sin6_addr.u.Byte_mut() = address.octets();
                    *raw.u.sin6_scope_id_mut() = scope.to_be();
                }

                let bytes = unsafe {
                    std::slice::from_raw_parts(&raw as *const _ as *const u8, length)
                };
                buffer[..length].copy_from_slice(bytes);
                Ok(length)
            }
            Self::Unix { .. } => Err(Failure::new(ErrorKind::Unsupported)
                .with_context("unix domain sockets are not supported on this platform")),
        }
    }

    pub fn from_sockaddr(buffer: &[u8]) -> Result<SocketAddress> {
        use std::mem::size_of;
        use winapi::shared::ws2def::{AF_INET, AF_INET6, SOCKADDR_IN};
        use winapi::shared::ws2ipdef::SOCKADDR_IN6_LH;

        if buffer.len() < 4 {
            return Err(Failure::new(ErrorKind::InvalidArgument)
                .with_context("sockaddr buffer too small to carry a family tag"));
        }

        let family = u16::from_ne_bytes([buffer[0], buffer[1]]);

        match i32::from(family) {
            AF_INET => {
                if buffer.len() < size_of::<SOCKADDR_IN>() {
                    return Err(Failure::new(ErrorKind::InvalidArgument)
                        .with_context("truncated inet4 sockaddr"));
                }
                let raw = unsafe { &*(buffer.as_ptr() as *const SOCKADDR_IN) };
                let addr = unsafe { *raw.sin_addr.S_un.S_addr() };
                Ok(SocketAddress::Inet {
                    address: InetAddress::new(addr.to_ne_bytes()),
                    port: u16::from_be(raw.sin_port),
                })
            }
            AF_INET6 => {
                if buffer.len() < size_of::<SOCKADDR_IN6_LH>() {
                    return Err(Failure::new(ErrorKind::InvalidArgument)
                        .with_context("truncated inet6 sockaddr"));
                }
                let raw = unsafe { &*(buffer.as_ptr() as *const SOCKADDR_IN6_LH) };
                Ok(SocketAddress::Inet6 {
                    address: Inet6Address::new(unsafe { *raw.sin6_addr.u.Byte() }),
                    port: u16::from_be(raw.sin6_port),
                    flow_info: u32::from_be(raw.sin6_flowinfo),
                    scope: u32::from_be(unsafe { *raw.u.sin6_scope_id() }),
                })
            }
            other => Err(Failure::new(ErrorKind::InvalidArgument)
                .with_context(format!("unsupported address family {}", other))),
        }
    }
}
