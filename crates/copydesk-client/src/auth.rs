//! Client side of the password gate.
//!
//! The unlocked flag is the only thing persisted by a client. It is set once
//! after a successful check and never cleared.

use copydesk_core::AUTH_FLAG_KEY;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{ClientError, Result};
use crate::RelayClient;

/// Persistence for the unlocked flag.
pub trait FlagStore: Send + Sync {
    fn is_set(&self) -> bool;
    fn set(&self) -> Result<()>;
}

/// Flag that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    flag: AtomicBool,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for MemoryFlagStore {
    fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn set(&self) -> Result<()> {
        self.flag.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Flag kept as a small file named after the flag key.
#[derive(Debug, Clone)]
pub struct FileFlagStore {
    path: PathBuf,
}

impl FileFlagStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(AUTH_FLAG_KEY),
        }
    }

    /// Store under `<config dir>/copydesk`, falling back to `~/.config/copydesk`.
    pub fn in_config_dir() -> Option<Self> {
        let config_dir = dirs::config_dir().or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(Self::new(config_dir.join("copydesk")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FlagStore for FileFlagStore {
    fn is_set(&self) -> bool {
        std::fs::read_to_string(&self.path)
            .map(|contents| contents.trim() == "true")
            .unwrap_or(false)
    }

    fn set(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, "true")?;
        log::debug!("Auth flag written to {}", self.path.display());
        Ok(())
    }
}

/// Password gate in front of a chat session.
pub struct AuthGate<S: FlagStore> {
    store: S,
}

impl<S: FlagStore> AuthGate<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn is_unlocked(&self) -> bool {
        self.store.is_set()
    }

    /// Check `password` with the relay and persist the flag on success.
    ///
    /// A rejection is reported as `ClientError::IncorrectPassword`.
    pub async fn unlock<C: RelayClient + ?Sized>(&self, client: &C, password: &str) -> Result<()> {
        if client.authenticate(password).await? {
            self.store.set()?;
            log::info!("Chat unlocked");
            Ok(())
        } else {
            Err(ClientError::IncorrectPassword)
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
