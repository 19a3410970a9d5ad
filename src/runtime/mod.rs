//! # Supervisor Runtime
//!
//! Host-side run loop around a [`ConnectionSupervisor`].
//!
//! ## Lifecycle
//!
//! 1. Load configuration: `SupervisorConfig::load("netkeeper.json")`
//! 2. Build the runtime: `SupervisorRuntime::from_config(config, interface, transport)`
//! 3. Run: `runtime.run()` on a thread, or `runtime.run_async().await`
//! 4. Stop gracefully: `runtime.stop()`
//!
//! ## Example
//!
//! ```ignore
//! let runtime = SupervisorRuntime::from_config(config, driver, TcpClient::new());
//! let mut states = runtime.subscribe();
//! runtime.run();
//! ```

pub mod config;

use config::SupervisorConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use tokio::sync::watch;

use crate::logging::LogLevel;
use crate::net::{ClientTransport, NetworkInterface, TcpClient};
use crate::supervisor::{ConnectionSupervisor, NetState};

pub struct SupervisorRuntime<N: NetworkInterface, T: ClientTransport = TcpClient> {
    supervisor: Mutex<ConnectionSupervisor<N, T>>,
    running: AtomicBool,
    poll_interval: Duration,
    state_tx: watch::Sender<NetState>,
}

impl<N: NetworkInterface, T: ClientTransport> SupervisorRuntime<N, T> {
    pub fn new(supervisor: ConnectionSupervisor<N, T>, poll_interval: Duration) -> Arc<Self> {
        let (state_tx, _) = watch::channel(supervisor.state());
        Arc::new(Self {
            supervisor: Mutex::new(supervisor),
            running: AtomicBool::new(true),
            poll_interval,
            state_tx,
        })
    }

    pub fn from_config(config: SupervisorConfig, interface: N, transport: T) -> Arc<Self> {
        let poll_interval = Duration::from_millis(config.poll_interval_ms);
        Self::new(ConnectionSupervisor::new(config, interface, transport), poll_interval)
    }

    /// Watch channel holding the latest settled state. A receiver that
    /// checks less often than the runtime steps only sees the newest value,
    /// not every transition in between.
    pub fn subscribe(&self) -> watch::Receiver<NetState> {
        self.state_tx.subscribe()
    }

    /// Step the supervisor once and publish the result.
    ///
    /// A transition callback runs after the supervisor lock is released, so
    /// it may call [`with_supervisor`](Self::with_supervisor).
    pub fn poll_once(&self) -> NetState {
        let (state, edge) = self.lock().advance();
        if let Some(edge) = edge {
            let callback = self.lock().take_callback(edge);
            if let Some(mut callback) = callback {
                callback();
                self.lock().restore_callback(edge, callback);
            }
        }
        self.state_tx.send_if_modified(|current| {
            if *current != state {
                *current = state;
                true
            } else {
                false
            }
        });
        state
    }

    pub fn run(&self) {
        self.log(LogLevel::Info, "Run loop started");
        while self.running.load(Ordering::Relaxed) {
            self.poll_once();
            thread::sleep(self.poll_interval);
        }
        self.log(LogLevel::Info, "Run loop stopped");
    }

    pub async fn run_async(&self) {
        self.log(LogLevel::Info, "Async run loop started");
        while self.running.load(Ordering::Relaxed) {
            self.poll_once();
            tokio::time::sleep(self.poll_interval).await;
        }
        self.log(LogLevel::Info, "Async run loop stopped");
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Borrow the supervisor between steps, e.g. to register callbacks or
    /// fetch the transport. Safe to call from a transition callback.
    pub fn with_supervisor<R>(&self, f: impl FnOnce(&mut ConnectionSupervisor<N, T>) -> R) -> R {
        let mut guard = self.lock();
        f(&mut *guard)
    }

    fn lock(&self) -> MutexGuard<'_, ConnectionSupervisor<N, T>> {
        self.supervisor.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn log(&self, level: LogLevel, msg: &str) {
        let logger = self.lock().logger();
        logger.log(level, "Runtime", msg);
    }
}
