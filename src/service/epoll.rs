use std::ptr;
use std::time::Duration;

use libc::c_int;

use crate::error::Result;
use crate::network::sys::last_network_failure;
use crate::network::{Socket, SocketOperation};
use crate::service::{Backend, SocketEvent};

pub(super) fn create() -> Result<Backend> {
    let epfd = unsafe { libc::epoll_create1(0) };
    if epfd < 0 {
        return Err(last_network_failure().with_context("failed to initialize epoll"));
    }
    Ok(Backend::Epoll { epfd })
}

fn to_epoll_events(ops: SocketOperation) -> u32 {
    let mut events = 0;

    if ops.contains(SocketOperation::READ) {
        events |= libc::EPOLLIN as u32;
    }
    if ops.contains(SocketOperation::WRITE) {
        events |= libc::EPOLLOUT as u32;
    }
    if ops.contains(SocketOperation::ERROR) {
        // a half-close is only delivered when RDHUP is asked for explicitly
        events |= libc::EPOLLERR as u32 | libc::EPOLLRDHUP as u32;
    }

    events
}

// hang-ups surface as errors so callers always observe a dead peer
fn from_epoll_events(events: u32) -> SocketOperation {
    let mut ops = SocketOperation::empty();

    if events & libc::EPOLLIN as u32 != 0 {
        ops |= SocketOperation::READ;
    }
    if events & libc::EPOLLOUT as u32 != 0 {
        ops |= SocketOperation::WRITE;
    }
    if events & (libc::EPOLLERR as u32 | libc::EPOLLHUP as u32 | libc::EPOLLRDHUP as u32) != 0 {
        ops |= SocketOperation::ERROR;
    }

    ops
}

pub(super) fn update(
    epfd: c_int,
    sock: Socket,
    old_ops: SocketOperation,
    new_ops: SocketOperation,
) -> Result<()> {
    let mut event = libc::epoll_event {
        events: to_epoll_events(new_ops),
        u64: sock.raw() as u64,
    };

    let op = if old_ops.is_empty() {
        libc::EPOLL_CTL_ADD
    } else {
        libc::EPOLL_CTL_MOD
    };

    if unsafe { libc::epoll_ctl(epfd, op, sock.raw(), &mut event) } < 0 {
        return Err(last_network_failure().with_context(format!(
            "failed to modify socket '{}' on epoll (events={:?})",
            sock, new_ops
        )));
    }
    Ok(())
}

pub(super) fn remove(epfd: c_int, sock: Socket) -> Result<()> {
    if unsafe { libc::epoll_ctl(epfd, libc::EPOLL_CTL_DEL, sock.raw(), ptr::null_mut()) } < 0 {
        return Err(last_network_failure()
            .with_context(format!("failed to remove socket '{}' from epoll", sock)));
    }
    Ok(())
}

pub(super) fn wait(
    epfd: c_int,
    capacity: usize,
    timeout: Option<Duration>,
) -> Result<Vec<SocketEvent>> {
    let mut events = vec![libc::epoll_event { events: 0, u64: 0 }; capacity];

    let millis: c_int = match timeout {
        Some(timeout) => timeout.as_millis().min(c_int::MAX as u128) as c_int,
        None => -1,
    };

    let count = unsafe {
        libc::epoll_wait(epfd, events.as_mut_ptr(), capacity as c_int, millis)
    };

    if count < 0 {
        return Err(last_network_failure().with_context("epoll failed"));
    }

    let mut ready = Vec::with_capacity(count as usize);
    for event in events.iter().take(count as usize) {
        let ops = from_epoll_events(event.events);
        if !ops.is_empty() {
            ready.push(SocketEvent {
                sock: Socket::from_raw(event.u64 as crate::network::RawSocketHandle),
                events: ops,
            });
        }
    }

    Ok(ready)
}
