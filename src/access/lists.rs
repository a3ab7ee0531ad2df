//! IP admission lists
//!
//! Both files hold one IP address per line. Lines shorter than two
//! characters are ignored.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{DataError, Result};

fn read_addresses(path: &Path, kind: &str) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| {
        DataError::Config(format!("cannot open {} file {}: {}", kind, path.display(), e))
    })?;

    let mut addresses = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let address = line.trim();
        if address.len() >= 2 {
            addresses.push(address.to_string());
        }
    }
    tracing::info!("{}: {} addresses from {}", kind, addresses.len(), path.display());
    Ok(addresses)
}

/// Static allow-list, read once at startup
#[derive(Debug, Clone, Default)]
pub struct IpList {
    addresses: Vec<String>,
}

impl IpList {
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            addresses: addresses.into_iter().map(Into::into).collect(),
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            addresses: read_addresses(path, "whitelist")?,
        })
    }

    pub fn contains(&self, ip: &str) -> bool {
        self.addresses.iter().any(|address| address == ip)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Deny-list, grown at runtime and appended to its file on every addition
#[derive(Debug)]
pub struct Blacklist {
    addresses: Mutex<Vec<String>>,
    path: PathBuf,
}

impl Blacklist {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            addresses: Mutex::new(read_addresses(path, "blacklist")?),
            path: path.to_path_buf(),
        })
    }

    pub fn contains(&self, ip: &str) -> bool {
        self.addresses.lock().iter().any(|address| address == ip)
    }

    /// Ban `ip` and append it to the file.
    ///
    /// The in-memory list is updated even when the file write fails.
    pub fn add(&self, ip: &str) -> Result<()> {
        let mut addresses = self.addresses.lock();
        if addresses.iter().any(|address| address == ip) {
            return Ok(());
        }
        addresses.push(ip.to_string());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", ip)?;
        file.sync_data()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.addresses.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.lock().is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
