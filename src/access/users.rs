//! Credential file and password hashing
//!
//! One credential per line: `username, role, hexhash, salt`, where
//! `hexhash` is the lowercase hex SHA-256 of the password followed by the
//! salt. Blank lines and lines starting with `#` are skipped.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::{DataError, Result};

use super::Role;

/// Salt length used for new credentials
pub const SALT_LEN: usize = 64;

const SALT_CHARSET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-+*/[]{}~&#><=|";

/// Hex SHA-256 of `password || salt`
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Random salt of `len` characters
pub fn generate_salt(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| SALT_CHARSET[rng.gen_range(0..SALT_CHARSET.len())] as char)
        .collect()
}

/// One entry of the users file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub user: String,
    pub role: Role,
    pub hash: String,
    pub salt: String,
}

impl Credential {
    /// Build a credential for `password` with a fresh salt
    pub fn new(user: impl Into<String>, role: Role, password: &str) -> Self {
        let salt = generate_salt(SALT_LEN);
        Self {
            user: user.into(),
            role,
            hash: hash_password(password, &salt),
            salt,
        }
    }

    /// Parse one users file line
    pub fn parse(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let &[user, role, hash, salt] = fields.as_slice() else {
            return Err(DataError::Config(format!(
                "credential needs 4 fields, found {}",
                fields.len()
            )));
        };
        if user.is_empty() || hash.is_empty() {
            return Err(DataError::Config("credential with empty user or hash".to_string()));
        }

        Ok(Self {
            user: user.to_string(),
            role: role.parse()?,
            hash: hash.to_ascii_lowercase(),
            salt: salt.to_string(),
        })
    }

    pub fn matches(&self, password: &str) -> bool {
        hash_password(password, &self.salt) == self.hash
    }
}

/// Users file line
impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}, {}", self.user, self.role, self.hash, self.salt)
    }
}

/// Loaded credentials
#[derive(Debug, Clone, Default)]
pub struct UserDb {
    credentials: Vec<Credential>,
}

impl UserDb {
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self { credentials }
    }

    /// Read a users file
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            DataError::Config(format!("cannot open users file {}: {}", path.display(), e))
        })?;
        let db = Self::parse(BufReader::new(file))?;
        tracing::info!("{} users loaded from {}", db.len(), path.display());
        Ok(db)
    }

    pub fn parse<R: BufRead>(input: R) -> Result<Self> {
        let mut credentials = Vec::new();
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            credentials.push(Credential::parse(line)?);
        }
        Ok(Self { credentials })
    }

    /// Role of `user` if `password` matches its stored hash
    pub fn verify(&self, user: &str, password: &str) -> Result<Role> {
        self.credentials
            .iter()
            .find(|credential| credential.user == user && credential.matches(password))
            .map(|credential| credential.role)
            .ok_or_else(|| DataError::Authentication(user.to_string()))
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}
