use std::fmt;

use serde::Serialize;

/// Raw platform error code (`errno` on POSIX, `WSAGetLastError` on Windows).
pub type ErrorCode = i32;

/// Classification of a platform error code.
///
/// Failures compare by kind, never by platform code, so callers can match
/// on a kind without caring which operating system produced it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum ErrorKind {
    Success,
    Failure,
    AccessDenied,
    DiskFull,
    Exists,
    InvalidArgument,
    NotFound,
    InsufficientResources,
    Interrupted,
    ResourceNotAvailable,
    NetInProgress,
    NetAgain,
    NetWouldBlock,
    NetworkDown,
    ConnAborted,
    ConnRefused,
    ConnReset,
    Connected,
    Disconnected,
    Timeout,
    Unsupported,
    SizeExceeded,
    Cancelled,
    NotInitialized,
    NotImplemented,
}

impl ErrorKind {
    /// Stable short name, usable in log lines and direct comparisons.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Success => "E_SUCCESS",
            Self::Failure => "E_FAILURE",
            Self::AccessDenied => "E_ACCESS_DENIED",
            Self::DiskFull => "E_DISK_FULL",
            Self::Exists => "E_EXISTS",
            Self::InvalidArgument => "E_INVALID_ARGUMENT",
            Self::NotFound => "E_NOT_FOUND",
            Self::InsufficientResources => "E_INSUFFICIENT_RESOURCES",
            Self::Interrupted => "E_INTERRUPTED",
            Self::ResourceNotAvailable => "E_RESOURCE_NOT_AVAILABLE",
            Self::NetInProgress => "E_NET_INPROGRESS",
            Self::NetAgain => "E_NET_AGAIN",
            Self::NetWouldBlock => "E_NET_WOULD_BLOCK",
            Self::NetworkDown => "E_NET_NETWORK_DOWN",
            Self::ConnAborted => "E_NET_CONN_ABORTED",
            Self::ConnRefused => "E_NET_CONN_REFUSED",
            Self::ConnReset => "E_NET_CONN_RESET",
            Self::Connected => "E_NET_CONNECTED",
            Self::Disconnected => "E_NET_DISCONNECTED",
            Self::Timeout => "E_NET_TIMEOUT",
            Self::Unsupported => "E_NOT_SUPPORTED",
            Self::SizeExceeded => "E_NET_SIZE_EXCEEDED",
            Self::Cancelled => "E_CANCELLED",
            Self::NotInitialized => "E_NOT_INITIALIZED",
            Self::NotImplemented => "E_NOT_IMPLEMENTED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Classified failure value.
///
/// Pairs the raw platform code with its classification and an optional
/// breadcrumb trail built up with [`Failure::with_context`].
#[derive(Clone, Debug)]
pub struct Failure {
    kind: ErrorKind,
    platform_code: ErrorCode,
    context: String,
}

impl Failure {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            platform_code: 0,
            context: String::new(),
        }
    }

    pub fn with_code(kind: ErrorKind, platform_code: ErrorCode) -> Self {
        Self {
            kind,
            platform_code,
            context: String::new(),
        }
    }

    /// Free-form failure with no classification beyond `Failure`.
    pub fn message(msg: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Failure,
            platform_code: 0,
            context: msg.into(),
        }
    }

    /// Capture and classify the calling thread's last platform error.
    pub fn last_os_error() -> Self {
        let code = last_error_code();
        Self::with_code(classify_error_code(code), code)
    }

    /// Prepend a context message. Repeated application composes the chain
    /// `outermost: inner: innermost`.
    pub fn with_context(mut self, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        if self.context.is_empty() {
            self.context = msg;
        } else {
            self.context = format!("{}: {}", msg, self.context);
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn platform_code(&self) -> ErrorCode {
        self.platform_code
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

impl PartialEq for Failure {
    // two failures are the same failure when the classification matches
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for Failure {}

impl PartialEq<ErrorKind> for Failure {
    fn eq(&self, kind: &ErrorKind) -> bool {
        self.kind == *kind
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind.name())?;
        if !self.context.is_empty() {
            write!(f, " {}", self.context)?;
        }
        if self.platform_code != 0 {
            write!(f, " (os error {})", self.platform_code)?;
        }
        Ok(())
    }
}

impl std::error::Error for Failure {}

impl From<ErrorKind> for Failure {
    fn from(kind: ErrorKind) -> Self {
        Failure::new(kind)
    }
}

impl From<std::num::ParseIntError> for Failure {
    fn from(error: std::num::ParseIntError) -> Self {
        Failure::new(ErrorKind::InvalidArgument).with_context(error.to_string())
    }
}

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Failure>;

#[cfg(unix)]
fn last_error_code() -> ErrorCode {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

#[cfg(windows)]
fn last_error_code() -> ErrorCode {
    unsafe { winapi::um::winsock2::WSAGetLastError() }
}

/// Map a raw platform code onto the closed [`ErrorKind`] set.
///
/// Unlisted codes classify as `Failure` and keep the raw code.
#[cfg(unix)]
pub fn classify_error_code(code: ErrorCode) -> ErrorKind {
    match code {
        0 => ErrorKind::Success,
        libc::EACCES | libc::EPERM => ErrorKind::AccessDenied,
        libc::ENOSPC => ErrorKind::DiskFull,
        libc::EEXIST => ErrorKind::Exists,
        libc::EINVAL | libc::EBADF | libc::ENOTSOCK => ErrorKind::InvalidArgument,
        libc::ENOENT => ErrorKind::NotFound,
        libc::ENOMEM | libc::ENOBUFS | libc::EMFILE | libc::ENFILE => {
            ErrorKind::InsufficientResources
        }
        libc::EINTR => ErrorKind::Interrupted,
        libc::EADDRINUSE | libc::EADDRNOTAVAIL => ErrorKind::ResourceNotAvailable,
        libc::EINPROGRESS | libc::EALREADY => ErrorKind::NetInProgress,
        libc::EWOULDBLOCK => ErrorKind::NetWouldBlock,
        libc::ENETDOWN | libc::ENETUNREACH => ErrorKind::NetworkDown,
        libc::ECONNABORTED | libc::EHOSTUNREACH => ErrorKind::ConnAborted,
        libc::ECONNREFUSED => ErrorKind::ConnRefused,
        libc::ECONNRESET | libc::EPIPE => ErrorKind::ConnReset,
        libc::EISCONN => ErrorKind::Connected,
        libc::ENOTCONN => ErrorKind::Disconnected,
        libc::ETIMEDOUT => ErrorKind::Timeout,
        libc::EOPNOTSUPP | libc::EAFNOSUPPORT | libc::EPROTONOSUPPORT => ErrorKind::Unsupported,
        libc::EMSGSIZE => ErrorKind::SizeExceeded,
        libc::ECANCELED => ErrorKind::Cancelled,
        libc::ENOSYS => ErrorKind::NotImplemented,
        _ => ErrorKind::Failure,
    }
}

#[cfg(windows)]
pub fn classify_error_code(code: ErrorCode) -> ErrorKind {
    use winapi::shared::winerror::*;

    match code as u32 {
        0 => ErrorKind::Success,
        WSAEACCES => ErrorKind::AccessDenied,
        WSAEINVAL | WSAEBADF | WSAENOTSOCK => ErrorKind::InvalidArgument,
        WSAEMFILE | WSAENOBUFS => ErrorKind::InsufficientResources,
        WSAEINTR => ErrorKind::Interrupted,
        WSAEADDRINUSE | WSAEADDRNOTAVAIL => ErrorKind::ResourceNotAvailable,
        WSAEINPROGRESS | WSAEALREADY => ErrorKind::NetInProgress,
        WSAEWOULDBLOCK => ErrorKind::NetWouldBlock,
        WSAENETDOWN | WSAENETUNREACH => ErrorKind::NetworkDown,
        WSAECONNABORTED | WSAEHOSTUNREACH => ErrorKind::ConnAborted,
        WSAECONNREFUSED => ErrorKind::ConnRefused,
        WSAECONNRESET => ErrorKind::ConnReset,
        WSAEISCONN => ErrorKind::Connected,
        WSAENOTCONN => ErrorKind::Disconnected,
        WSAETIMEDOUT => ErrorKind::Timeout,
        WSAEOPNOTSUPP | WSAEAFNOSUPPORT | WSAEPROTONOSUPPORT => ErrorKind::Unsupported,
        WSAEMSGSIZE => ErrorKind::SizeExceeded,
        WSAECANCELLED => ErrorKind::Cancelled,
        _ => ErrorKind::Failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_compare_by_kind() {
        let a = Failure::with_code(ErrorKind::NetWouldBlock, 11);
        let b = Failure::with_code(ErrorKind::NetWouldBlock, 10035);
        assert_eq!(a, b);
        assert_eq!(a, ErrorKind::NetWouldBlock);
        assert_ne!(a, Failure::new(ErrorKind::ConnReset));
    }

    #[test]
    fn context_composes_outermost_first() {
        let failure = Failure::new(ErrorKind::ConnRefused)
            .with_context("connect failed")
            .with_context("request aborted");
        assert_eq!(failure.context(), "request aborted: connect failed");
    }

    #[test]
    fn display_includes_name_and_code() {
        let failure = Failure::with_code(ErrorKind::ConnReset, 104).with_context("peer went away");
        let text = failure.to_string();
        assert!(text.contains("E_NET_CONN_RESET"));
        assert!(text.contains("peer went away"));
        assert!(text.contains("104"));
    }

    #[cfg(unix)]
    #[test]
    fn errno_classification() {
        assert_eq!(classify_error_code(libc::EWOULDBLOCK), ErrorKind::NetWouldBlock);
        assert_eq!(classify_error_code(libc::ECONNRESET), ErrorKind::ConnReset);
        assert_eq!(classify_error_code(libc::ECONNREFUSED), ErrorKind::ConnRefused);
        assert_eq!(classify_error_code(libc::EINPROGRESS), ErrorKind::NetInProgress);
        assert_eq!(classify_error_code(libc::EADDRINUSE), ErrorKind::ResourceNotAvailable);
        // a code outside the policy table keeps the generic classification
        assert_eq!(classify_error_code(libc::EXDEV), ErrorKind::Failure);
    }
}
