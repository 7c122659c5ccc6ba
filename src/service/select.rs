use std::mem;
use std::ptr;
use std::time::Duration;

use crate::error::{ErrorKind, Failure, Result};
use crate::network::sys::last_network_failure;
use crate::network::{Socket, SocketOperation};
use crate::service::SocketEvent;

/// One `select` round: build the three descriptor sets from the interest
/// snapshot, wait, then scan the snapshot for set bits.
pub(super) fn wait(
    interest: &[(Socket, SocketOperation)],
    timeout: Option<Duration>,
) -> Result<Vec<SocketEvent>> {
    let mut reads: libc::fd_set = unsafe { mem::zeroed() };
    let mut writes: libc::fd_set = unsafe { mem::zeroed() };
    let mut errors: libc::fd_set = unsafe { mem::zeroed() };

    unsafe {
        libc::FD_ZERO(&mut reads);
        libc::FD_ZERO(&mut writes);
        libc::FD_ZERO(&mut errors);
    }

    let mut nfds: libc::c_int = 0;

    for (sock, ops) in interest {
        let fd = sock.raw();

        if fd >= libc::FD_SETSIZE as libc::c_int {
            return Err(Failure::new(ErrorKind::SizeExceeded).with_context(format!(
                "socket '{}' exceeds the select() descriptor limit",
                sock
            )));
        }

        nfds = nfds.max(fd + 1);

        unsafe {
            if ops.contains(SocketOperation::READ) {
                libc::FD_SET(fd, &mut reads);
            }
            if ops.contains(SocketOperation::WRITE) {
                libc::FD_SET(fd, &mut writes);
            }
            if ops.contains(SocketOperation::ERROR) {
                libc::FD_SET(fd, &mut errors);
            }
        }
    }

    let mut storage = libc::timeval {
        tv_sec: 0,
        tv_usec: 0,
    };
    let duration: *mut libc::timeval = match timeout {
        Some(timeout) => {
            storage.tv_sec = timeout.as_secs() as libc::time_t;
            storage.tv_usec = timeout.subsec_micros() as libc::suseconds_t;
            &mut storage
        }
        None => ptr::null_mut(),
    };

    let result = unsafe { libc::select(nfds, &mut reads, &mut writes, &mut errors, duration) };

    if result < 0 {
        return Err(last_network_failure().with_context("failed to execute select()"));
    }
    if result == 0 {
        return Ok(Vec::new());
    }

    let mut ready = Vec::with_capacity(interest.len());

    for (sock, ops) in interest {
        let fd = sock.raw();
        let mut forward = SocketOperation::empty();

        unsafe {
            if ops.contains(SocketOperation::READ) && libc::FD_ISSET(fd, &reads) {
                forward |= SocketOperation::READ;
            }
            if ops.contains(SocketOperation::WRITE) && libc::FD_ISSET(fd, &writes) {
                forward |= SocketOperation::WRITE;
            }
            if ops.contains(SocketOperation::ERROR) && libc::FD_ISSET(fd, &errors) {
                forward |= SocketOperation::ERROR;
            }
        }

        if !forward.is_empty() {
            ready.push(SocketEvent {
                sock: *sock,
                events: forward,
            });
        }
    }

    Ok(ready)
}
