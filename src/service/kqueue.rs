use std::ptr;
use std::time::Duration;

use libc::c_int;

use crate::error::Result;
use crate::network::sys::last_network_failure;
use crate::network::{Socket, SocketOperation};
use crate::service::{Backend, SocketEvent};

pub(super) fn create() -> Result<Backend> {
    let kq = unsafe { libc::kqueue() };
    if kq < 0 {
        return Err(last_network_failure().with_context("failed to initialize kqueue"));
    }
    Ok(Backend::Kqueue { kq })
}

fn change(sock: Socket, filter: i16, flags: u16) -> libc::kevent {
    libc::kevent {
        ident: sock.raw() as libc::uintptr_t,
        filter,
        flags,
        fflags: 0,
        data: 0,
        udata: ptr::null_mut(),
    }
}

/// Apply the interest transition as one change list: one kevent per
/// (socket, filter) pair. Error interest has no filter of its own; errors
/// come back on whichever filter fires, flagged `EV_ERROR`/`EV_EOF`.
pub(super) fn update(
    kq: c_int,
    sock: Socket,
    old_ops: SocketOperation,
    new_ops: SocketOperation,
) -> Result<()> {
    let mut changes: Vec<libc::kevent> = Vec::with_capacity(2);

    let filters = [
        (SocketOperation::READ, libc::EVFILT_READ),
        (SocketOperation::WRITE, libc::EVFILT_WRITE),
    ];

    for (op, filter) in filters.iter() {
        let had = old_ops.contains(*op);
        let has = new_ops.contains(*op);

        if has && !had {
            changes.push(change(sock, *filter, libc::EV_ADD));
        } else if had && !has {
            changes.push(change(sock, *filter, libc::EV_DELETE));
        }
    }

    if changes.is_empty() {
        return Ok(());
    }

    let result = unsafe {
        libc::kevent(
            kq,
            changes.as_ptr(),
            changes.len() as c_int,
            ptr::null_mut(),
            0,
            ptr::null(),
        )
    };

    if result < 0 {
        return Err(last_network_failure().with_context(format!(
            "failed to modify socket '{}' on kqueue (events={:?})",
            sock, new_ops
        )));
    }
    Ok(())
}

pub(super) fn wait(
    kq: c_int,
    capacity: usize,
    timeout: Option<Duration>,
) -> Result<Vec<SocketEvent>> {
    let mut events = vec![change(Socket::from_raw(0), 0, 0); capacity];

    let mut storage = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    let duration: *const libc::timespec = match timeout {
        Some(timeout) => {
            storage.tv_sec = timeout.as_secs() as libc::time_t;
            storage.tv_nsec = timeout.subsec_nanos() as libc::c_long;
            &storage
        }
        None => ptr::null(),
    };

    let count = unsafe {
        libc::kevent(
            kq,
            ptr::null(),
            0,
            events.as_mut_ptr(),
            capacity as c_int,
            duration,
        )
    };

    if count < 0 {
        return Err(last_network_failure().with_context("kqueue failed"));
    }

    let mut ready = Vec::with_capacity(count as usize);
    for event in events.iter().take(count as usize) {
        let mut ops = SocketOperation::empty();

        if event.filter == libc::EVFILT_READ {
            ops |= SocketOperation::READ;
        }
        if event.filter == libc::EVFILT_WRITE {
            ops |= SocketOperation::WRITE;
        }
        if event.flags & (libc::EV_ERROR | libc::EV_EOF) != 0 {
            ops |= SocketOperation::ERROR;
        }

        if !ops.is_empty() {
            ready.push(SocketEvent {
                sock: Socket::from_raw(event.ident as crate::network::RawSocketHandle),
                events: ops,
            });
        }
    }

    Ok(ready)
}
