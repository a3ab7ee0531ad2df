//! Access Module
//!
//! Connection admission and authentication.
//!
//! ## Responsibilities
//! - Whitelist check, then blacklist check, before any protocol byte
//! - Password verification against the users file
//! - Persisting bans issued by the session layer

mod lists;
mod role;
mod users;

pub use lists::{Blacklist, IpList};
pub use role::Role;
pub use users::{generate_salt, hash_password, Credential, UserDb, SALT_LEN};

use crate::config::Config;
use crate::error::Result;

/// Verdict on a new connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    NotWhitelisted,
    Blacklisted,
}

/// Shared by every connection worker
#[derive(Debug)]
pub struct AccessControl {
    users: UserDb,
    whitelist: IpList,
    blacklist: Blacklist,
}

impl AccessControl {
    pub fn new(users: UserDb, whitelist: IpList, blacklist: Blacklist) -> Self {
        Self {
            users,
            whitelist,
            blacklist,
        }
    }

    /// Load every access file named in `config`.
    ///
    /// The users file may only be absent when authentication is not
    /// required; sessions then start as normal users and cannot log in.
    pub fn open(config: &Config) -> Result<Self> {
        let users = if config.require_auth || config.users_file.exists() {
            UserDb::open(&config.users_file)?
        } else {
            tracing::info!(
                "no users file at {}, login disabled",
                config.users_file.display()
            );
            UserDb::default()
        };
        let whitelist = IpList::open(&config.whitelist_file)?;
        let blacklist = Blacklist::open(&config.blacklist_file)?;
        Ok(Self::new(users, whitelist, blacklist))
    }

    pub fn admit(&self, ip: &str) -> Admission {
        if !self.whitelist.contains(ip) {
            Admission::NotWhitelisted
        } else if self.blacklist.contains(ip) {
            Admission::Blacklisted
        } else {
            Admission::Accepted
        }
    }

    pub fn authenticate(&self, user: &str, password: &str) -> Result<Role> {
        self.users.verify(user, password)
    }

    /// Add `ip` to the blacklist and its file
    pub fn ban(&self, ip: &str) -> Result<()> {
        tracing::info!("banning {}", ip);
        self.blacklist.add(ip)
    }

    pub fn blacklist(&self) -> &Blacklist {
        &self.blacklist
    }

    pub fn whitelist(&self) -> &IpList {
        &self.whitelist
    }
}
