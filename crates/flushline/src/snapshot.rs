//! One-time-readable request state and its streaming snapshot.
//!
//! The flash store sweeps itself on first read and the token store commits
//! a fresh token to the session on first use. Once a response starts
//! streaming, neither may be touched lazily from view code: the flash would
//! be swept twice and the session can no longer be written. Streaming setup
//! therefore reads both eagerly and parks the values here; view-level reads
//! return the parked values for the rest of the request.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::debug;

use crate::error::{BoxError, RenderError, RenderResult};

/// Flash messages keyed by kind (`notice`, `alert`, ...).
pub type Flash = BTreeMap<String, String>;

/// Destructive flash accessor.
pub trait FlashStore: Send + Sync {
    /// Return the current messages and clear them.
    fn sweep(&self) -> Flash;
}

/// Session-backed CSRF token accessor.
pub trait TokenStore: Send + Sync {
    /// Return the token, generating and committing it on first call.
    fn token(&self) -> Result<String, BoxError>;
}

/// In-memory flash store.
#[derive(Debug, Default)]
pub struct MemoryFlash {
    entries: Mutex<Flash>,
}

impl MemoryFlash {
    pub fn new(entries: Flash) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub fn with(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Flash::from([(kind.into(), message.into())]))
    }

    pub fn set(&self, kind: impl Into<String>, message: impl Into<String>) {
        let mut entries = self.entries.lock().expect("flash lock");
        entries.insert(kind.into(), message.into());
    }
}

impl FlashStore for MemoryFlash {
    fn sweep(&self) -> Flash {
        let mut entries = self.entries.lock().expect("flash lock");
        std::mem::take(&mut *entries)
    }
}

/// Token store that generates a random token and records session commits.
#[derive(Debug, Default)]
pub struct SessionTokens {
    token: Mutex<Option<String>>,
    commits: AtomicUsize,
}

impl SessionTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times a token was written to the session.
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

impl TokenStore for SessionTokens {
    fn token(&self) -> Result<String, BoxError> {
        let mut slot = self.token.lock().expect("token lock");
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }
        let mut raw = [0u8; 32];
        getrandom::getrandom(&mut raw)?;
        let token = hex::encode(raw);
        *slot = Some(token.clone());
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(token)
    }
}

/// View-facing flash reads with an optional snapshot.
#[derive(Clone)]
pub struct FlashAccess {
    store: Arc<dyn FlashStore>,
    snapshot: Arc<OnceLock<Flash>>,
}

impl FlashAccess {
    pub fn new(store: Arc<dyn FlashStore>) -> Self {
        Self {
            store,
            snapshot: Arc::new(OnceLock::new()),
        }
    }

    /// The snapshot if one was taken, otherwise a destructive read.
    pub fn read(&self) -> Flash {
        match self.snapshot.get() {
            Some(flash) => flash.clone(),
            None => self.store.sweep(),
        }
    }

    /// Read the store once and keep the result for later reads.
    pub fn take_snapshot(&self) -> &Flash {
        self.snapshot.get_or_init(|| {
            let flash = self.store.sweep();
            debug!(entries = flash.len(), "flash snapshot taken");
            flash
        })
    }

    pub fn is_snapshotted(&self) -> bool {
        self.snapshot.get().is_some()
    }
}

impl fmt::Debug for FlashAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlashAccess")
            .field("snapshot", &self.snapshot.get())
            .finish_non_exhaustive()
    }
}

/// View-facing token reads with an optional snapshot.
#[derive(Clone)]
pub struct TokenAccess {
    store: Arc<dyn TokenStore>,
    snapshot: Arc<OnceLock<String>>,
}

impl TokenAccess {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            snapshot: Arc::new(OnceLock::new()),
        }
    }

    pub fn read(&self) -> RenderResult<String> {
        match self.snapshot.get() {
            Some(token) => Ok(token.clone()),
            None => self.store.token().map_err(RenderError::Token),
        }
    }

    /// Force token generation now and keep the value.
    pub fn take_snapshot(&self) -> RenderResult<&str> {
        if self.snapshot.get().is_none() {
            let token = self.store.token().map_err(RenderError::Token)?;
            debug!("csrf token snapshot taken");
            let _ = self.snapshot.set(token);
        }
        Ok(self.snapshot.get().map(String::as_str).unwrap_or_default())
    }

    pub fn is_snapshotted(&self) -> bool {
        self.snapshot.get().is_some()
    }
}

impl fmt::Debug for TokenAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAccess")
            .field("snapshotted", &self.is_snapshotted())
            .finish_non_exhaustive()
    }
}
