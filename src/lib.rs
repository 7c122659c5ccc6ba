//! Portable network I/O core: a blocking socket facade over the kernel's
//! sockets, a readiness multiplexer with a per-platform backend, and the
//! collaborators they need (classified failures, bounded byte cursors,
//! streaming hashes, wire-level address values).
//!
//! The crate is strictly blocking; callers that want a task-based model
//! wrap [`SocketService::execute`] in a thread of their own.

pub mod address;
pub mod error;
pub mod hash;
pub mod http;
pub mod memory;
pub mod network;
pub mod pair;
pub mod service;

pub use address::{
    AddressFamily, Inet6Address, InetAddress, MulticastGroup, ParsedAddress, SocketAddress,
    UnixPath,
};
pub use error::{ErrorCode, ErrorKind, Failure, Result};
pub use hash::{Fnv32, Fnv64, Fnva32, Fnva64, Hasher, Hmac, Md5, Sha1, Sha256};
pub use http::{HttpClient, HttpMethod, HttpOptions, HttpRequest, HttpResponse};
pub use memory::{MemoryReader, MemoryWriter};
pub use network::{
    AcceptedSocket, AddressInfo, AddressInfoFlags, MessageOption, Network, RecvFromData, Socket,
    SocketConfig, SocketOperation, SocketOpt, SocketOptionValue, SocketProtocol,
    SocketShutdownMode, SocketType, INVALID_SOCKET, TCP_V4, TCP_V6, UDP_V4, UDP_V6,
};
pub use pair::{SocketPair, SocketPairMode};
pub use service::{BackendType, ServiceParams, SocketEvent, SocketService};
