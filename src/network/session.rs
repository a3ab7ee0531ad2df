//! Session state machine
//!
//! Per-connection protocol state: authentication, permission checks and
//! command dispatch. Holds no I/O; the connection feeds it one line at a
//! time and writes back whatever reply it returns.
//!
//! ```text
//!   Unauthenticated ──login ok──▶ Authenticated(role) ──close/exit──▶ Closed
//!          │
//!          └──3rd failed login──▶ Banned
//! ```

use crate::access::{AccessControl, Role};
use crate::engine::Engine;
use crate::error::{DataError, Result};
use crate::protocol::{Command, CommandType, Response};

/// Consecutive failed logins before the peer is banned
pub const MAX_AUTH_FAILURES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(Role),
    Closed,
    Banned,
}

/// What the connection does after sending the reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Close,
    /// Close, then stop the server
    Shutdown,
}

/// Result of one line
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// `None` means the line is ignored without a reply
    pub reply: Option<Response>,
    pub action: Action,
}

impl Outcome {
    fn reply(response: Response) -> Self {
        Self {
            reply: Some(response),
            action: Action::Continue,
        }
    }

    fn silent() -> Self {
        Self {
            reply: None,
            action: Action::Continue,
        }
    }

    fn then(mut self, action: Action) -> Self {
        self.action = action;
        self
    }
}

/// State of one client connection
#[derive(Debug)]
pub struct Session {
    peer_ip: String,
    state: SessionState,
    failures: u32,
}

impl Session {
    /// Without required authentication a session starts as a normal user
    pub fn new(peer_ip: impl Into<String>, require_auth: bool) -> Self {
        let state = if require_auth {
            SessionState::Unauthenticated
        } else {
            SessionState::Authenticated(Role::NormalUser)
        };
        Self {
            peer_ip: peer_ip.into(),
            state,
            failures: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn role(&self) -> Option<Role> {
        match self.state {
            SessionState::Authenticated(role) => Some(role),
            _ => None,
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn peer_ip(&self) -> &str {
        &self.peer_ip
    }

    /// Process one command line (without its newline)
    pub fn handle_line(&mut self, line: &str, engine: &Engine, access: &AccessControl) -> Outcome {
        tracing::trace!("{} > {}", self.peer_ip, line);

        match self.state {
            SessionState::Closed | SessionState::Banned => Outcome::silent().then(Action::Close),
            SessionState::Unauthenticated => match CommandType::match_prefix(line) {
                Some(CommandType::Login) => self.login(line, access),
                Some(CommandType::Close) => self.close(),
                _ => Outcome::silent(),
            },
            SessionState::Authenticated(role) => self.dispatch(line, role, engine, access),
        }
    }

    fn dispatch(
        &mut self,
        line: &str,
        role: Role,
        engine: &Engine,
        access: &AccessControl,
    ) -> Outcome {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!("{}: rejected line: {}", self.peer_ip, e);
                return Outcome::reply(Response::from_error(&e));
            }
        };

        if let Err(e) = authorize(command.command_type(), role) {
            tracing::warn!("{}: {}", self.peer_ip, e);
            return Outcome::reply(Response::from_error(&e));
        }

        match command {
            Command::Login { .. } => self.login(line, access),
            Command::Close => self.close(),
            Command::Exit => {
                tracing::info!("{}: exit requested", self.peer_ip);
                self.state = SessionState::Closed;
                Outcome::reply(Response::Ok).then(Action::Shutdown)
            }
            command => match engine.execute(&command) {
                Ok(response) => Outcome::reply(response),
                Err(e) => {
                    tracing::debug!(
                        "{}: {} failed: {}",
                        self.peer_ip,
                        command.command_type().token(),
                        e
                    );
                    Outcome::reply(Response::from_error(&e))
                }
            },
        }
    }

    fn close(&mut self) -> Outcome {
        self.state = SessionState::Closed;
        Outcome::reply(Response::Ok).then(Action::Close)
    }

    /// A malformed login line counts as a failed attempt
    fn login(&mut self, line: &str, access: &AccessControl) -> Outcome {
        let verified = match Command::parse(line) {
            Ok(Command::Login { user, password }) => access.authenticate(&user, &password),
            Ok(_) => Err(DataError::syntax("malformed login")),
            Err(e) => Err(e),
        };

        match verified {
            Ok(role) => {
                tracing::info!("{}: logged in as {}", self.peer_ip, role);
                self.state = SessionState::Authenticated(role);
                self.failures = 0;
                Outcome::reply(Response::Ok)
            }
            Err(e) => {
                self.failures += 1;
                tracing::warn!(
                    "{}: login failed ({} of {}): {}",
                    self.peer_ip,
                    self.failures,
                    MAX_AUTH_FAILURES,
                    e
                );
                if self.failures < MAX_AUTH_FAILURES {
                    return Outcome::reply(Response::Error);
                }

                if let Err(e) = access.ban(&self.peer_ip) {
                    tracing::error!("{}: could not persist ban: {}", self.peer_ip, e);
                }
                self.state = SessionState::Banned;
                Outcome::reply(Response::Error).then(Action::Close)
            }
        }
    }
}

/// Role check for a command
pub fn authorize(command_type: CommandType, role: Role) -> Result<()> {
    if command_type.requires_admin() && !role.can_admin() {
        return Err(DataError::PermissionDenied {
            command: command_type.token(),
            required: Role::Admin.as_str(),
        });
    }
    if command_type.is_mutating() && !role.can_write() {
        return Err(DataError::PermissionDenied {
            command: command_type.token(),
            required: Role::NormalUser.as_str(),
        });
    }
    Ok(())
}
