#[cfg(unix)]
mod select;

#[cfg(any(target_os = "linux", target_os = "android"))]
mod epoll;

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]
mod kqueue;

#[cfg(windows)]
mod iocp;

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{ErrorKind, Failure, Result};
use crate::network::{Network, Socket, SocketOperation, INVALID_SOCKET};
use crate::pair::{SocketPair, SocketPairMode};

/// One readiness report from [`SocketService::execute`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SocketEvent {
    pub sock: Socket,
    pub events: SocketOperation,
}

/// Kernel primitive behind a [`SocketService`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BackendType {
    Select,
    Epoll,
    Kqueue,
    Iocp,
}

/// Service construction parameters.
#[derive(Clone, Copy, Debug)]
pub struct ServiceParams {
    /// Requested backend; `None` picks the best primitive per platform.
    pub backend: Option<BackendType>,

    /// Completions dequeued per wait on a completion-based backend. Has no
    /// effect on the readiness backends.
    pub batch_size: u32,
}

impl Default for ServiceParams {
    fn default() -> Self {
        Self {
            backend: None,
            batch_size: 8,
        }
    }
}

enum Backend {
    Inactive,
    #[cfg(unix)]
    Select,
    #[cfg(any(target_os = "linux", target_os = "android"))]
    Epoll { epfd: libc::c_int },
    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd"
    ))]
    Kqueue { kq: libc::c_int },
    #[cfg(windows)]
    Iocp { port: usize, batch: usize },
}

struct ServiceState {
    interest: HashMap<Socket, SocketOperation>,
    started: bool,
    shutdown: bool,
    polling: bool,
    notify: bool,
    #[cfg(windows)]
    probes: iocp::ProbeTable,
}

impl ServiceState {
    fn new() -> Self {
        Self {
            interest: HashMap::new(),
            started: false,
            shutdown: false,
            polling: false,
            notify: false,
            #[cfg(windows)]
            probes: iocp::ProbeTable::new(),
        }
    }
}

/// Readiness multiplexer over a set of sockets.
///
/// Callers register interest with [`add`](SocketService::add), block in
/// [`execute`](SocketService::execute) for up to a timeout, and react to
/// the reported [`SocketEvent`]s. Interest mutations are safe from any
/// thread while another thread is blocked in `execute`; a mutation during
/// a wait sends a byte down the internal wake pipe so the wait re-enters
/// with the new interest set. The service never closes caller-owned
/// sockets.
pub struct SocketService {
    network: Arc<Network>,
    backend: Backend,
    requested: Option<BackendType>,
    batch_size: u32,
    wake_reader: Socket,
    wake_writer: Socket,
    pipe: Mutex<Option<SocketPair>>,
    state: Mutex<ServiceState>,
    idle: Condvar,
}

impl SocketService {
    /// A service that still needs [`start`](SocketService::start).
    pub fn new(params: ServiceParams, network: Arc<Network>) -> Self {
        Self {
            network,
            backend: Backend::Inactive,
            batch_size: params.batch_size,
            requested: params.backend,
            wake_reader: INVALID_SOCKET,
            wake_writer: INVALID_SOCKET,
            pipe: Mutex::new(None),
            state: Mutex::new(ServiceState::new()),
            idle: Condvar::new(),
        }
    }

    /// Construct and start in one step.
    pub fn create(params: ServiceParams, network: Arc<Network>) -> Result<Self> {
        let mut service = Self::new(params, network);
        service
            .start()
            .map_err(|e| e.with_context("failed to start socket service"))?;
        Ok(service)
    }

    pub fn backend_type(&self) -> Option<BackendType> {
        match self.backend {
            Backend::Inactive => None,
            #[cfg(unix)]
            Backend::Select => Some(BackendType::Select),
            #[cfg(any(target_os = "linux", target_os = "android"))]
            Backend::Epoll { .. } => Some(BackendType::Epoll),
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "netbsd",
                target_os = "openbsd"
            ))]
            Backend::Kqueue { .. } => Some(BackendType::Kqueue),
            #[cfg(windows)]
            Backend::Iocp { .. } => Some(BackendType::Iocp),
        }
    }

    /// Bring up the wake pipe and the kernel primitive, and register the
    /// wake socket with `Read|Error` interest.
    pub fn start(&mut self) -> Result<()> {
        {
            let state = self.lock_state();
            if state.started || state.shutdown {
                return Err(Failure::new(ErrorKind::Failure)
                    .with_context("socket service already started or stopped"));
            }
        }

        let pair = SocketPair::create(self.network.clone(), SocketPairMode::NonBlocking)?;
        let wake_reader = pair.reader();
        let wake_writer = pair.writer();

        let backend = create_backend(self.requested, self.batch_size)?;
        self.backend = backend;
        self.wake_reader = wake_reader;
        self.wake_writer = wake_writer;

        let wake_ops = SocketOperation::READ | SocketOperation::ERROR;
        if let Err(failure) = self.backend_update(wake_reader, SocketOperation::empty(), wake_ops) {
            self.close_backend();
            self.backend = Backend::Inactive;
            self.wake_reader = INVALID_SOCKET;
            self.wake_writer = INVALID_SOCKET;
            return Err(failure.with_context("failed to register the wake socket"));
        }

        {
            let mut state = self.lock_state();
            state.interest.insert(wake_reader, wake_ops);
            state.started = true;
        }
        *lock_ignore_poison(&self.pipe) = Some(pair);

        log::debug!(
            "socket service started (backend={:?}, wake={})",
            self.backend_type(),
            wake_reader
        );
        Ok(())
    }

    /// Union `ops` into the interest set for `sock`. First add creates the
    /// entry; adding a subset of the current interest is a no-op.
    pub fn add(&self, sock: Socket, ops: SocketOperation) -> Result<()> {
        let mut state = self.lock_state();
        self.check_mutable(&state, sock)?;

        if ops.is_empty() {
            return Ok(());
        }

        match state.interest.get(&sock).copied() {
            Some(current) => {
                let merged = current | ops;
                if merged == current {
                    return Ok(());
                }
                self.backend_update(sock, current, merged)?;
                state.interest.insert(sock, merged);
            }
            None => {
                self.backend_update(sock, SocketOperation::empty(), ops)?;
                state.interest.insert(sock, ops);
            }
        }

        if state.polling {
            self.wake();
        }
        Ok(())
    }

    /// Subtract `ops` from the interest set for `sock`. Subtracting the
    /// error interest drops the socket entirely, as does a residual of
    /// nothing but error interest.
    pub fn remove(&self, sock: Socket, ops: SocketOperation) -> Result<()> {
        let mut state = self.lock_state();
        self.check_mutable(&state, sock)?;

        if ops.is_empty() {
            return Ok(());
        }

        let current = match state.interest.get(&sock).copied() {
            Some(current) => current,
            None => return Ok(()),
        };

        let mut residual = current & !ops;
        if ops.contains(SocketOperation::ERROR) || residual == SocketOperation::ERROR {
            residual = SocketOperation::empty();
        }

        if residual == current {
            return Ok(());
        }

        if residual.is_empty() {
            self.backend_remove(sock, current)?;
            state.interest.remove(&sock);
        } else {
            self.backend_update(sock, current, residual)?;
            state.interest.insert(sock, residual);
        }

        if state.polling {
            self.wake();
        }
        Ok(())
    }

    /// Drop `sock` from the interest set unconditionally. Does not close
    /// the kernel socket; the caller owns it.
    pub fn close(&self, sock: Socket) -> Result<()> {
        let mut state = self.lock_state();
        self.check_mutable(&state, sock)?;

        if let Some(current) = state.interest.remove(&sock) {
            self.backend_remove(sock, current)?;
            if state.polling {
                self.wake();
            }
        }
        Ok(())
    }

    /// Wake a concurrent [`execute`](SocketService::execute) early. Safe
    /// from any thread, before, during, or after a wait; a notify with no
    /// wait in flight makes the next `execute` return immediately with an
    /// empty event set.
    pub fn notify(&self) {
        let mut state = self.lock_state();
        if state.shutdown {
            return;
        }

        // flag first, then the wake byte; execute clears both after the wait
        state.notify = true;
        if state.polling {
            self.wake();
        }
    }

    /// Block for up to `timeout` and copy the ready events into `events`.
    ///
    /// `None` blocks indefinitely; `Some(Duration::ZERO)` polls and
    /// returns. The sink is cleared on entry and owned by the caller; it
    /// is never retained. At most one `execute` may run at a time.
    pub fn execute(
        &self,
        timeout: Option<Duration>,
        events: &mut Vec<SocketEvent>,
    ) -> Result<usize> {
        events.clear();

        let mut state = self.lock_state();

        if state.shutdown {
            return Err(Failure::new(ErrorKind::Cancelled)
                .with_context("socket service is stopped"));
        }
        if !state.started {
            return Err(Failure::new(ErrorKind::NotInitialized)
                .with_context("socket service is not started"));
        }

        debug_assert!(!state.polling, "concurrent execute on a socket service");

        if state.notify {
            state.notify = false;
            return Ok(0);
        }

        let snapshot: Vec<(Socket, SocketOperation)> = state
            .interest
            .iter()
            .map(|(&sock, &ops)| (sock, ops))
            .collect();

        #[cfg(windows)]
        {
            if let Backend::Iocp { port, .. } = &self.backend {
                iocp::ensure_probes(*port, &snapshot, &mut state.probes)?;
            }
        }

        state.polling = true;
        drop(state);

        let waited = self.backend_wait(&snapshot, timeout);

        let mut state = self.lock_state();
        state.polling = false;
        state.notify = false;
        self.idle.notify_all();

        if state.shutdown {
            // stop raced the wait; report the cancellation as a clean exit
            return Ok(0);
        }

        let ready = waited?;

        let mut wake_fired = false;
        for event in ready {
            if event.sock == self.wake_reader {
                wake_fired = true;
                continue;
            }
            #[cfg(windows)]
            state.probes.consume(event.sock, event.events);
            if !event.events.is_empty() {
                events.push(event);
            }
        }
        drop(state);

        if wake_fired {
            let pipe = lock_ignore_poison(&self.pipe);
            if let Some(pipe) = pipe.as_ref() {
                pipe.drain()
                    .map_err(|e| e.with_context("failed to drain the notification socket"))?;
            }
        }

        Ok(events.len())
    }

    /// Cancel pending and future waits and tear the service down.
    /// Idempotent; every call reports the same terminal status.
    pub fn stop(&self) -> Result<()> {
        let mut state = self.lock_state();
        if state.shutdown {
            return Ok(());
        }

        state.shutdown = true;
        state.interest.clear();

        if state.polling {
            self.wake();
            while state.polling {
                state = wait_ignore_poison(&self.idle, state);
            }
        }
        drop(state);

        self.close_backend();

        if let Some(mut pipe) = lock_ignore_poison(&self.pipe).take() {
            let _ = pipe.stop();
        }

        log::debug!("socket service stopped");
        Ok(())
    }

    fn check_mutable(&self, state: &ServiceState, sock: Socket) -> Result<()> {
        if state.shutdown {
            return Err(
                Failure::new(ErrorKind::Failure).with_context("socket service is stopped")
            );
        }
        if !sock.is_valid() {
            return Err(Failure::new(ErrorKind::InvalidArgument).with_context("invalid socket"));
        }
        if !state.started {
            return Err(Failure::new(ErrorKind::NotInitialized)
                .with_context("socket service is not started"));
        }
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, ServiceState> {
        lock_ignore_poison(&self.state)
    }

    // one byte down the pipe; a full pipe already carries a pending wake
    fn wake(&self) {
        if self.wake_writer.is_valid() {
            let _ = self.network.send(self.wake_writer, b"w");
        }
    }

    fn backend_update(
        &self,
        sock: Socket,
        old_ops: SocketOperation,
        new_ops: SocketOperation,
    ) -> Result<()> {
        match &self.backend {
            Backend::Inactive => Err(Failure::new(ErrorKind::NotInitialized)
                .with_context("pollset not yet initialized")),
            #[cfg(unix)]
            Backend::Select => Ok(()),
            #[cfg(any(target_os = "linux", target_os = "android"))]
            Backend::Epoll { epfd } => epoll::update(*epfd, sock, old_ops, new_ops),
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "netbsd",
                target_os = "openbsd"
            ))]
            Backend::Kqueue { kq } => kqueue::update(*kq, sock, old_ops, new_ops),
            #[cfg(windows)]
            Backend::Iocp { port, .. } => iocp::associate(*port, sock, old_ops),
        }
    }

    fn backend_remove(&self, sock: Socket, old_ops: SocketOperation) -> Result<()> {
        match &self.backend {
            Backend::Inactive => Err(Failure::new(ErrorKind::NotInitialized)
                .with_context("pollset not yet initialized")),
            #[cfg(unix)]
            Backend::Select => Ok(()),
            #[cfg(any(target_os = "linux", target_os = "android"))]
            Backend::Epoll { epfd } => epoll::remove(*epfd, sock),
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "netbsd",
                target_os = "openbsd"
            ))]
            Backend::Kqueue { kq } => kqueue::update(*kq, sock, old_ops, SocketOperation::empty()),
            #[cfg(windows)]
            Backend::Iocp { .. } => Ok(()),
        }
    }

    fn backend_wait(
        &self,
        snapshot: &[(Socket, SocketOperation)],
        timeout: Option<Duration>,
    ) -> Result<Vec<SocketEvent>> {
        match &self.backend {
            Backend::Inactive => Err(Failure::new(ErrorKind::NotInitialized)
                .with_context("pollset not yet initialized")),
            #[cfg(unix)]
            Backend::Select => select::wait(snapshot, timeout),
            #[cfg(any(target_os = "linux", target_os = "android"))]
            Backend::Epoll { epfd } => epoll::wait(*epfd, snapshot.len().max(1), timeout),
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "netbsd",
                target_os = "openbsd"
            ))]
            Backend::Kqueue { kq } => kqueue::wait(*kq, snapshot.len().max(1) * 2, timeout),
            #[cfg(windows)]
            Backend::Iocp { port, batch } => iocp::wait(*port, *batch, timeout),
        }
    }

    fn close_backend(&self) {
        match &self.backend {
            Backend::Inactive => {}
            #[cfg(unix)]
            Backend::Select => {}
            #[cfg(any(target_os = "linux", target_os = "android"))]
            Backend::Epoll { epfd } => unsafe {
                libc::close(*epfd);
            },
            #[cfg(any(
                target_os = "macos",
                target_os = "ios",
                target_os = "freebsd",
                target_os = "netbsd",
                target_os = "openbsd"
            ))]
            Backend::Kqueue { kq } => unsafe {
                libc::close(*kq);
            },
            #[cfg(windows)]
            Backend::Iocp { port, .. } => iocp::close_port(*port),
        }
    }
}

impl Drop for SocketService {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

// the best primitive per platform, in the spirit of the backend table
fn default_backend(batch_size: u32) -> Result<Backend> {
    let _ = batch_size;

    #[cfg(any(target_os = "linux", target_os = "android"))]
    return epoll::create();

    #[cfg(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd"
    ))]
    return kqueue::create();

    #[cfg(windows)]
    return iocp::create(batch_size);

    #[cfg(all(
        unix,
        not(any(
            target_os = "linux",
            target_os = "android",
            target_os = "macos",
            target_os = "ios",
            target_os = "freebsd",
            target_os = "netbsd",
            target_os = "openbsd"
        ))
    ))]
    return Ok(Backend::Select);
}

fn create_backend(requested: Option<BackendType>, batch_size: u32) -> Result<Backend> {
    match requested {
        None => default_backend(batch_size),
        #[cfg(unix)]
        Some(BackendType::Select) => Ok(Backend::Select),
        #[cfg(any(target_os = "linux", target_os = "android"))]
        Some(BackendType::Epoll) => epoll::create(),
        #[cfg(any(
            target_os = "macos",
            target_os = "ios",
            target_os = "freebsd",
            target_os = "netbsd",
            target_os = "openbsd"
        ))]
        Some(BackendType::Kqueue) => kqueue::create(),
        #[cfg(windows)]
        Some(BackendType::Iocp) => iocp::create(batch_size),
        Some(other) => Err(Failure::new(ErrorKind::Unsupported)
            .with_context(format!("backend {:?} is not available on this platform", other))),
    }
}

fn lock_ignore_poison<'a, T>(mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn wait_ignore_poison<'a, T>(
    condvar: &Condvar,
    guard: MutexGuard<'a, T>,
) -> MutexGuard<'a, T> {
    condvar
        .wait(guard)
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
