//! TCP Server
//!
//! Accepts connections and hands each admitted one to its own thread.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::access::{AccessControl, Admission};
use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;

use super::connection::Connection;
use super::session::Action;

/// Accept loop poll interval while idle
const ACCEPT_POLL: Duration = Duration::from_millis(25);

/// Cloneable stop switch for a running [`Server`]
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// TCP server for l1data
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    access: Arc<AccessControl>,
    listener: TcpListener,
    shutdown: ShutdownHandle,
    active: Arc<AtomicUsize>,
}

impl Server {
    /// Bind the listener described by `config`
    pub fn bind(config: Config, engine: Arc<Engine>, access: Arc<AccessControl>) -> Result<Self> {
        let listener = TcpListener::bind(config.listen_addr())?;
        listener.set_nonblocking(true)?;
        tracing::info!("listening on {}", listener.local_addr()?);

        Ok(Self {
            config,
            engine,
            access,
            listener,
            shutdown: ShutdownHandle::default(),
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Signal the server to stop accepting connections
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Accept connections until shut down (blocking)
    ///
    /// Connections still open at shutdown keep their threads; they end
    /// with the process.
    pub fn run(&self) -> Result<()> {
        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, addr)) => self.accept(stream, addr),
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::warn!("accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL);
                }
            }
        }

        tracing::info!(
            "server stopped accepting, {} connections still open",
            self.active_connections()
        );
        Ok(())
    }

    fn accept(&self, stream: TcpStream, addr: SocketAddr) {
        let ip = addr.ip().to_string();
        match self.access.admit(&ip) {
            Admission::Accepted => {}
            Admission::NotWhitelisted => {
                tracing::warn!("refused {}: not whitelisted", addr);
                return;
            }
            Admission::Blacklisted => {
                tracing::warn!("refused {}: blacklisted", addr);
                return;
            }
        }

        if self.active.load(Ordering::SeqCst) >= self.config.max_connections {
            tracing::warn!(
                "refused {}: {} connections open",
                addr,
                self.config.max_connections
            );
            return;
        }

        if let Err(e) = self.spawn_worker(stream, addr) {
            tracing::warn!("could not serve {}: {}", addr, e);
        }
    }

    fn spawn_worker(&self, stream: TcpStream, addr: SocketAddr) -> Result<()> {
        stream.set_nonblocking(false)?;
        let mut connection = Connection::new(
            stream,
            Arc::clone(&self.engine),
            Arc::clone(&self.access),
            self.config.require_auth,
        )?;
        connection.set_timeouts(self.config.read_timeout_ms, self.config.write_timeout_ms)?;

        let guard = ActiveGuard::new(Arc::clone(&self.active));
        let shutdown = self.shutdown.clone();

        thread::Builder::new()
            .name(format!("conn-{}", addr))
            .spawn(move || {
                let _guard = guard;
                let peer = connection.peer_addr().to_string();
                let result = connection.handle();
                drop(connection);

                match result {
                    Ok(Action::Shutdown) => {
                        tracing::info!("shutdown requested by {}", peer);
                        shutdown.shutdown();
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("connection {} ended: {}", peer, e),
                }
            })?;
        Ok(())
    }
}

/// Counts a connection as active until dropped
struct ActiveGuard {
    active: Arc<AtomicUsize>,
}

impl ActiveGuard {
    fn new(active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self { active }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
