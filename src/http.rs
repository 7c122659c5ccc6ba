use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::address::{parse_address, ParsedAddress, SocketAddress};
use crate::error::{ErrorKind, Failure, Result};
use crate::network::{
    options, AddressInfo, Network, Socket, SocketOperation, SocketProtocol, SocketType,
    TCP_V4, TCP_V6,
};
use crate::service::{ServiceParams, SocketEvent, SocketService};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum HttpMethod {
    Delete,
    Get,
    Head,
    Options,
    Post,
    Put,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        let mut request = Self::new(HttpMethod::Post, url);
        request.body = body.into();
        request
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content_length(&self) -> Option<usize> {
        self.header("Content-Length")?.trim().parse().ok()
    }
}

#[derive(Clone, Debug)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub max_response_size: usize,
    pub user_agent: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(30),
            max_response_size: 16 * 1024 * 1024,
            user_agent: String::from("netbase/0.1"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct ParsedUrl {
    host: String,
    port: u16,
    path: String,
}

fn parse_url(url: &str) -> Result<ParsedUrl> {
    let rest = if let Some(rest) = url.strip_prefix("http://") {
        rest
    } else if url.starts_with("https://") {
        return Err(Failure::new(ErrorKind::Unsupported)
            .with_context("https is not provided at this layer"));
    } else {
        return Err(Failure::new(ErrorKind::InvalidArgument)
            .with_context(format!("unsupported url '{}'", url)));
    };

    if rest.is_empty() {
        return Err(Failure::new(ErrorKind::InvalidArgument).with_context("empty host"));
    }

    let (authority, path) = match rest.find('/') {
        Some(index) => (&rest[..index], &rest[index..]),
        None => (rest, "/"),
    };

    let (host, port) = if let Some(v6) = authority.strip_prefix('[') {
        let close = v6.find(']').ok_or_else(|| {
            Failure::new(ErrorKind::InvalidArgument)
                .with_context(format!("unterminated bracket in '{}'", authority))
        })?;
        let host = &v6[..close];
        let port = match &v6[close + 1..] {
            "" => 80,
            tail => tail
                .strip_prefix(':')
                .and_then(|p| p.parse::<u16>().ok())
                .ok_or_else(|| {
                    Failure::new(ErrorKind::InvalidArgument)
                        .with_context(format!("invalid port in '{}'", authority))
                })?,
        };
        (host.to_string(), port)
    } else {
        match authority.rfind(':') {
            Some(index) => {
                let port = authority[index + 1..].parse::<u16>().map_err(|_| {
                    Failure::new(ErrorKind::InvalidArgument)
                        .with_context(format!("invalid port in '{}'", authority))
                })?;
                (authority[..index].to_string(), port)
            }
            None => (authority.to_string(), 80),
        }
    };

    if host.is_empty() {
        return Err(Failure::new(ErrorKind::InvalidArgument).with_context("empty host"));
    }

    Ok(ParsedUrl {
        host,
        port,
        path: path.to_string(),
    })
}

fn serialize_request(request: &HttpRequest, url: &ParsedUrl, user_agent: &str) -> Vec<u8> {
    let mut head = String::with_capacity(256);

    head.push_str(request.method.as_str());
    head.push(' ');
    head.push_str(&url.path);
    head.push_str(" HTTP/1.1\r\n");

    if url.port == 80 {
        head.push_str(&format!("Host: {}\r\n", url.host));
    } else {
        head.push_str(&format!("Host: {}:{}\r\n", url.host, url.port));
    }

    let mut has_agent = false;
    for (name, value) in &request.headers {
        if name.eq_ignore_ascii_case("User-Agent") {
            has_agent = true;
        }
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    if !has_agent {
        head.push_str(&format!("User-Agent: {}\r\n", user_agent));
    }
    if !request.body.is_empty() || matches!(request.method, HttpMethod::Post | HttpMethod::Put) {
        head.push_str(&format!("Content-Length: {}\r\n", request.body.len()));
    }
    head.push_str("Connection: close\r\n\r\n");

    let mut bytes = head.into_bytes();
    bytes.extend_from_slice(&request.body);
    bytes
}

fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

fn parse_head(head: &str) -> Result<HttpResponse> {
    let mut lines = head.split("\r\n");

    let status_line = lines
        .next()
        .ok_or_else(|| Failure::new(ErrorKind::Failure).with_context("empty response head"))?;

    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap_or("");
    if !version.starts_with("HTTP/1.") {
        return Err(Failure::new(ErrorKind::Failure)
            .with_context(format!("unexpected status line '{}'", status_line)));
    }

    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| {
            Failure::new(ErrorKind::Failure)
                .with_context(format!("unparseable status in '{}'", status_line))
        })?;
    let reason = parts.next().unwrap_or("").to_string();

    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if let Some(index) = line.find(':') {
            headers.push((
                line[..index].trim().to_string(),
                line[index + 1..].trim().to_string(),
            ));
        }
    }

    Ok(HttpResponse {
        status,
        reason,
        headers,
        body: Vec::new(),
    })
}

/// Blocking HTTP/1.1 client over the socket facade.
///
/// Each request runs a single-threaded reactor loop: a non-blocking
/// connect driven to completion through a [`SocketService`], then writes
/// and reads interleaved with readiness waits. Plain text only.
pub struct HttpClient {
    network: Arc<Network>,
    options: HttpOptions,
}

impl HttpClient {
    pub fn new(network: Arc<Network>) -> Self {
        Self::with_options(network, HttpOptions::default())
    }

    pub fn with_options(network: Arc<Network>, options: HttpOptions) -> Self {
        Self { network, options }
    }

    pub fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let url = parse_url(&request.url)?;
        let address = self.lookup(&url)?;

        let config = match address {
            SocketAddress::Inet6 { .. } => TCP_V6,
            _ => TCP_V4,
        };

        let sock = self.network.create_socket(config)?;

        let result = self.execute_on(request, &url, &address, sock);
        let _ = self.network.close(sock);
        result
    }

    fn lookup(&self, url: &ParsedUrl) -> Result<SocketAddress> {
        if let Ok(parsed) = parse_address(&url.host) {
            return Ok(match parsed {
                ParsedAddress::Inet4(address) => SocketAddress::inet(address, url.port),
                ParsedAddress::Inet6(address) => SocketAddress::inet6(address, url.port),
            });
        }

        let mut hints = AddressInfo::hints();
        hints.socket_type = SocketType::Stream;
        hints.protocol = SocketProtocol::Tcp;

        let entries = self
            .network
            .resolve(&url.host, None, Some(&hints))
            .map_err(|e| e.with_context(format!("failed to resolve host '{}'", url.host)))?;

        let address = entries[0].address;
        Ok(match address {
            SocketAddress::Inet { address, .. } => SocketAddress::inet(address, url.port),
            SocketAddress::Inet6 { address, .. } => SocketAddress::inet6(address, url.port),
            SocketAddress::Unix { .. } => {
                return Err(Failure::new(ErrorKind::InvalidArgument)
                    .with_context("resolver returned a non-inet address"))
            }
        })
    }

    fn execute_on(
        &self,
        request: &HttpRequest,
        url: &ParsedUrl,
        address: &SocketAddress,
        sock: Socket,
    ) -> Result<HttpResponse> {
        let network = &self.network;
        network.set_blocking(sock, false)?;

        let service = SocketService::create(ServiceParams::default(), network.clone())?;
        let mut events: Vec<SocketEvent> = Vec::new();

        // drive the non-blocking connect to completion
        if let Err(failure) = network.connect(sock, address) {
            if failure != ErrorKind::NetInProgress && failure != ErrorKind::NetWouldBlock {
                return Err(failure.with_context(format!("failed to connect to '{}'", address)));
            }

            service.add(sock, SocketOperation::WRITE | SocketOperation::ERROR)?;
            service.execute(Some(self.options.connect_timeout), &mut events)?;
            service.remove(sock, SocketOperation::WRITE)?;

            if events.is_empty() {
                return Err(Failure::new(ErrorKind::Timeout)
                    .with_context(format!("timed out connecting to '{}'", address)));
            }

            let status = network.get_socket_option::<options::SocketError>(sock)?;
            if status != 0 {
                return Err(Failure::with_code(
                    crate::error::classify_error_code(status),
                    status,
                )
                .with_context(format!("failed to connect to '{}'", address)));
            }
        }

        log::debug!("connected to {} for {}", address, url.host);

        self.send_all(&service, sock, &serialize_request(request, url, &self.options.user_agent))?;
        let response = self.read_response(&service, sock)?;

        let _ = service.close(sock);
        let _ = service.stop();

        Ok(response)
    }

    fn send_all(&self, service: &SocketService, sock: Socket, data: &[u8]) -> Result<()> {
        let mut events: Vec<SocketEvent> = Vec::new();
        let mut offset = 0;

        while offset < data.len() {
            match self.network.send(sock, &data[offset..]) {
                Ok(sent) => offset += sent,
                Err(failure) if failure == ErrorKind::NetWouldBlock => {
                    service.add(sock, SocketOperation::WRITE | SocketOperation::ERROR)?;
                    service.execute(Some(self.options.read_timeout), &mut events)?;
                    service.remove(sock, SocketOperation::WRITE)?;
                    if events.is_empty() {
                        return Err(Failure::new(ErrorKind::Timeout)
                            .with_context("timed out sending the request"));
                    }
                }
                Err(failure) => {
                    return Err(failure.with_context("failed to send the request"));
                }
            }
        }

        Ok(())
    }

    fn read_response(&self, service: &SocketService, sock: Socket) -> Result<HttpResponse> {
        service.add(sock, SocketOperation::READ | SocketOperation::ERROR)?;

        let mut events: Vec<SocketEvent> = Vec::new();
        let mut data: Vec<u8> = Vec::new();
        let mut buffer = [0u8; 4096];
        let mut closed = false;

        let (mut response, body_start) = loop {
            match self.network.recv(sock, &mut buffer) {
                Ok(received) => {
                    data.extend_from_slice(&buffer[..received]);
                    if data.len() > self.options.max_response_size {
                        return Err(Failure::new(ErrorKind::SizeExceeded)
                            .with_context("response exceeds the configured maximum"));
                    }
                }
                Err(failure) if failure == ErrorKind::NetWouldBlock => {
                    service.execute(Some(self.options.read_timeout), &mut events)?;
                    if events.is_empty() {
                        return Err(Failure::new(ErrorKind::Timeout)
                            .with_context("timed out waiting for the response"));
                    }
                    continue;
                }
                Err(failure) if failure == ErrorKind::Disconnected => {
                    closed = true;
                }
                Err(failure) => {
                    return Err(failure.with_context("failed to read the response"));
                }
            }

            if let Some(end) = find_header_end(&data) {
                let head = std::str::from_utf8(&data[..end]).map_err(|_| {
                    Failure::new(ErrorKind::Failure)
                        .with_context("response head is not valid text")
                })?;
                break (parse_head(head)?, end);
            }

            if closed {
                return Err(Failure::new(ErrorKind::Disconnected)
                    .with_context("connection closed before the response head"));
            }
        };

        let mut body = data[body_start..].to_vec();
        let wanted = response.content_length();

        while !closed {
            if let Some(wanted) = wanted {
                if body.len() >= wanted {
                    break;
                }
            }

            match self.network.recv(sock, &mut buffer) {
                Ok(received) => {
                    body.extend_from_slice(&buffer[..received]);
                    if body.len() > self.options.max_response_size {
                        return Err(Failure::new(ErrorKind::SizeExceeded)
                            .with_context("response exceeds the configured maximum"));
                    }
                }
                Err(failure) if failure == ErrorKind::NetWouldBlock => {
                    service.execute(Some(self.options.read_timeout), &mut events)?;
                    if events.is_empty() {
                        return Err(Failure::new(ErrorKind::Timeout)
                            .with_context("timed out reading the response body"));
                    }
                }
                Err(failure) if failure == ErrorKind::Disconnected => {
                    closed = true;
                }
                Err(failure) => {
                    return Err(failure.with_context("failed to read the response body"));
                }
            }
        }

        if let Some(wanted) = wanted {
            body.truncate(wanted);
        }
        response.body = body;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_parsing() {
        assert_eq!(
            parse_url("http://example.com/index.html").unwrap(),
            ParsedUrl {
                host: "example.com".to_string(),
                port: 80,
                path: "/index.html".to_string(),
            }
        );
        assert_eq!(
            parse_url("http://127.0.0.1:8080").unwrap(),
            ParsedUrl {
                host: "127.0.0.1".to_string(),
                port: 8080,
                path: "/".to_string(),
            }
        );
        assert_eq!(
            parse_url("http://[::1]:8080/status").unwrap(),
            ParsedUrl {
                host: "::1".to_string(),
                port: 8080,
                path: "/status".to_string(),
            }
        );

        assert_eq!(
            parse_url("https://example.com").unwrap_err(),
            ErrorKind::Unsupported
        );
        assert_eq!(
            parse_url("ftp://example.com").unwrap_err(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            parse_url("http://:8080").unwrap_err(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn request_serialization() {
        let url = parse_url("http://example.com:8080/data").unwrap();
        let request = HttpRequest::post("http://example.com:8080/data", b"payload".to_vec())
            .with_header("Accept", "application/json");

        let bytes = serialize_request(&request, &url, "netbase/0.1");
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("POST /data HTTP/1.1\r\n"));
        assert!(text.contains("Host: example.com:8080\r\n"));
        assert!(text.contains("Accept: application/json\r\n"));
        assert!(text.contains("Content-Length: 7\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.ends_with("\r\n\r\npayload"));
    }

    #[test]
    fn response_head_parsing() {
        let head = "HTTP/1.1 200 OK\r\nContent-Length: 12\r\nContent-Type: text/plain\r\n\r\n";
        let response = parse_head(head).unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.reason, "OK");
        assert_eq!(response.header("content-length"), Some("12"));
        assert_eq!(response.content_length(), Some(12));
        assert_eq!(response.header("Missing"), None);

        assert_eq!(
            parse_head("SMTP nope\r\n\r\n").unwrap_err(),
            ErrorKind::Failure
        );
    }

    #[test]
    fn header_end_detection() {
        assert_eq!(find_header_end(b"HTTP/1.1 200 OK\r\n\r\nbody"), Some(19));
        assert_eq!(find_header_end(b"HTTP/1.1 200 OK\r\n"), None);
    }
}
