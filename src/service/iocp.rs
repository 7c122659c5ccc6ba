//! Completion-port backend.
//!
//! IOCP is completion-based, so readiness is emulated: every socket with
//! read interest keeps one zero-byte `WSARecv` probe in flight, every
//! socket with write interest one zero-byte `WSASend` probe. A probe
//! completing means the socket can perform that operation; the probe is
//! re-posted on the next wait. The wake pipe participates like any other
//! socket, so `notify` semantics match the readiness backends.

use std::collections::HashMap;
use std::ptr;
use std::time::Duration;

use winapi::shared::minwindef::{DWORD, FALSE};
use winapi::shared::winerror::{ERROR_INVALID_PARAMETER, WAIT_TIMEOUT};
use winapi::um::errhandlingapi::GetLastError;
use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
use winapi::um::ioapiset::{CreateIoCompletionPort, GetQueuedCompletionStatusEx};
use winapi::um::minwinbase::{OVERLAPPED, OVERLAPPED_ENTRY};
use winapi::um::winnt::HANDLE;
use winapi::um::winsock2::{WSAGetLastError, WSARecv, WSASend, WSABUF};
use winapi::um::winsock2 as ws;

use crate::error::{ErrorKind, Failure, Result};
use crate::network::sys::last_network_failure;
use crate::network::{Socket, SocketOperation};
use crate::service::{Backend, SocketEvent};

const WSA_IO_PENDING: i32 = 997;

// The OVERLAPPED must be the first field: completion entries hand back a
// pointer to it and the whole record is recovered by cast.
#[repr(C)]
pub(super) struct ProbeRecord {
    overlapped: OVERLAPPED,
    flags: DWORD,
    sock: Socket,
    op: SocketOperation,
}

/// Bookkeeping for outstanding probes, guarded by the service mutex.
pub(super) struct ProbeTable {
    records: HashMap<usize, Box<ProbeRecord>>,
    pending: HashMap<(Socket, bool), usize>,
}

impl ProbeTable {
    pub(super) fn new() -> Self {
        Self {
            records: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    fn is_pending(&self, sock: Socket, is_read: bool) -> bool {
        self.pending.contains_key(&(sock, is_read))
    }

    fn insert(&mut self, record: Box<ProbeRecord>, is_read: bool) {
        let key = &record.overlapped as *const OVERLAPPED as usize;
        self.pending.insert((record.sock, is_read), key);
        self.records.insert(key, record);
    }

    /// Retire the probes behind a delivered event.
    pub(super) fn consume(&mut self, sock: Socket, events: SocketOperation) {
        let read = events.contains(SocketOperation::READ)
            || events.contains(SocketOperation::ERROR);
        let write = events.contains(SocketOperation::WRITE)
            || events.contains(SocketOperation::ERROR);

        if read {
            if let Some(key) = self.pending.remove(&(sock, true)) {
                self.records.remove(&key);
            }
        }
        if write {
            if let Some(key) = self.pending.remove(&(sock, false)) {
                self.records.remove(&key);
            }
        }
    }
}

impl Drop for ProbeTable {
    fn drop(&mut self) {
        // probes the kernel still owns must keep their memory alive; the
        // records leak and are reclaimed at process exit, like other
        // completion-port implementations handle teardown
        for (_, record) in self.records.drain() {
            Box::leak(record);
        }
    }
}

pub(super) fn create(batch: u32) -> Result<Backend> {
    let port = unsafe { CreateIoCompletionPort(INVALID_HANDLE_VALUE, ptr::null_mut(), 0, 0) };

    if port.is_null() {
        return Err(last_network_failure().with_context("failed to initialize completion port"));
    }

    Ok(Backend::Iocp {
        port: port as usize,
        batch: batch.max(1) as usize,
    })
}

pub(super) fn close_port(port: usize) {
    unsafe {
        CloseHandle(port as HANDLE);
    }
}

/// Associate a socket with the port on its first add. Subsequent adds are
/// interest-only changes and need no kernel call here.
pub(super) fn associate(port: usize, sock: Socket, old_ops: SocketOperation) -> Result<()> {
    if !old_ops.is_empty() {
        return Ok(());
    }

    let result = unsafe {
        CreateIoCompletionPort(
            sock.raw() as HANDLE,
            port as HANDLE,
            sock.raw() as usize,
            0,
        )
    };

    if result.is_null() {
        let code = unsafe { GetLastError() };
        // re-associating an already registered handle is not an error
        if code != ERROR_INVALID_PARAMETER {
            return Err(last_network_failure().with_context(format!(
                "failed to associate socket '{}' with the completion port",
                sock
            )));
        }
    }

    Ok(())
}

/// Post any probe the interest set expects but the kernel does not hold.
pub(super) fn ensure_probes(
    _port: usize,
    interest: &[(Socket, SocketOperation)],
    table: &mut ProbeTable,
) -> Result<()> {
    for (sock, ops) in interest {
        let wants_read =
            ops.contains(SocketOperation::READ) || ops.contains(SocketOperation::ERROR);
        let wants_write = ops.contains(SocketOperation::WRITE);

        if wants_read && !table.is_pending(*sock, true) {
            post_probe(*sock, true, table)?;
        }
        if wants_write && !table.is_pending(*sock, false) {
            post_probe(*sock, false, table)?;
        }
    }
    Ok(())
}

fn post_probe(sock: Socket, is_read: bool, table: &mut ProbeTable) -> Result<()> {
    let mut record = Box::new(ProbeRecord {
        overlapped: unsafe { std::mem::zeroed() },
        flags: 0,
        sock,
        op: if is_read {
            SocketOperation::READ
        } else {
            SocketOperation::WRITE
        },
    });

    let mut buffer = WSABUF {
        len: 0,
        buf: ptr::null_mut(),
    };
    let mut transferred: DWORD = 0;
    let overlapped = &mut record.overlapped as *mut OVERLAPPED;

    let result = unsafe {
        if is_read {
            WSARecv(
                sock.raw(),
                &mut buffer,
                1,
                &mut transferred,
                &mut record.flags,
                overlapped,
                None,
            )
        } else {
            WSASend(
                sock.raw(),
                &mut buffer,
                1,
                &mut transferred,
                0,
                overlapped,
                None,
            )
        }
    };

    if result == ws::SOCKET_ERROR {
        let code = unsafe { WSAGetLastError() };
        if code != WSA_IO_PENDING {
            return Err(Failure::with_code(
                crate::error::classify_error_code(code),
                code,
            )
            .with_context(format!(
                "failed to post a readiness probe on socket '{}'",
                sock
            )));
        }
    }

    // either queued, or completed immediately with the completion still
    // delivered through the port; the record stays alive in both cases
    table.insert(record, is_read);
    Ok(())
}

pub(super) fn wait(
    port: usize,
    batch: usize,
    timeout: Option<Duration>,
) -> Result<Vec<SocketEvent>> {
    let mut entries: Vec<OVERLAPPED_ENTRY> = vec![unsafe { std::mem::zeroed() }; batch];
    let mut count: DWORD = 0;

    let millis: DWORD = match timeout {
        Some(timeout) => timeout.as_millis().min(u128::from(DWORD::MAX - 1)) as DWORD,
        None => DWORD::MAX, // INFINITE
    };

    let result = unsafe {
        GetQueuedCompletionStatusEx(
            port as HANDLE,
            entries.as_mut_ptr(),
            batch as DWORD,
            &mut count,
            millis,
            FALSE,
        )
    };

    if result == FALSE {
        let code = unsafe { GetLastError() };
        if code == WAIT_TIMEOUT {
            return Ok(Vec::new());
        }
        return Err(Failure::with_code(
            crate::error::classify_error_code(code as i32),
            code as i32,
        )
        .with_context("completion port wait failed"));
    }

    let mut ready = Vec::with_capacity(count as usize);

    for entry in entries.iter().take(count as usize) {
        if entry.lpOverlapped.is_null() {
            continue;
        }

        let record = unsafe { &*(entry.lpOverlapped as *const ProbeRecord) };
        let failed = unsafe { (*entry.lpOverlapped).Internal } != 0;

        let events = if failed {
            SocketOperation::ERROR
        } else {
            record.op
        };

        ready.push(SocketEvent {
            sock: record.sock,
            events,
        });
    }

    Ok(ready)
}
