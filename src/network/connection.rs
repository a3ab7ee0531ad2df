//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::access::AccessControl;
use crate::engine::Engine;
use crate::error::{DataError, Result};
use crate::protocol::{read_line, write_response, Response};

use super::session::{Action, Session, SessionState};

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Shared store
    engine: Arc<Engine>,

    /// Shared user database and IP lists
    access: Arc<AccessControl>,

    /// Protocol state for this peer
    session: Session,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O; the session is keyed on the peer IP.
    pub fn new(
        stream: TcpStream,
        engine: Arc<Engine>,
        access: Arc<AccessControl>,
        require_auth: bool,
    ) -> Result<Self> {
        let peer = stream.peer_addr()?;
        let peer_addr = peer.to_string();

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            engine,
            access,
            session: Session::new(peer.ip().to_string(), require_auth),
            peer_addr,
        })
    }

    /// Configure connection timeouts
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.reader.get_ref();
        let write_stream = self.writer.get_ref();

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads lines in a loop and sends replies. Returns what the server
    /// should do once this connection is gone.
    pub fn handle(&mut self) -> Result<Action> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let line = match read_line(&mut self.reader) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(Action::Close);
                }
                Err(DataError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} went away: {}", self.peer_addr, e);
                    return Ok(Action::Close);
                }
                Err(DataError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(Action::Close);
                }
                Err(DataError::Io(e)) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(DataError::Io(e));
                }
                Err(e) => {
                    // Oversized or non-UTF-8 line: the stream can't be resynchronised
                    tracing::warn!("Dropping {}: {}", self.peer_addr, e);
                    if self.session.state() != SessionState::Unauthenticated {
                        let _ = self.send_response(&Response::from_error(&e));
                    }
                    return Ok(Action::Close);
                }
            };

            let outcome = self.session.handle_line(&line, &self.engine, &self.access);

            if let Some(response) = &outcome.reply {
                if let Err(e) = self.send_response(response) {
                    if let DataError::Io(ref io_err) = e {
                        if is_disconnect(io_err.kind()) {
                            tracing::debug!(
                                "Client {} disconnected before response could be sent: {}",
                                self.peer_addr,
                                e
                            );
                            return Ok(Action::Close);
                        }
                    }
                    tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            }

            if outcome.action != Action::Continue {
                tracing::debug!("Closing connection from {}", self.peer_addr);
                return Ok(outcome.action);
            }
        }
    }

    /// Send a response to the client
    fn send_response(&mut self, response: &Response) -> Result<()> {
        write_response(&mut self.writer, response)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
    )
}
