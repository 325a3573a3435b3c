use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default)]
    token: Option<String>,
}

/// Bearer token holder shared by the UI and every request.
///
/// The client never issues tokens; it stores whatever the user pastes and
/// forwards it.
#[derive(Clone, Debug)]
pub struct AuthSession {
    token: Arc<RwLock<Option<String>>>,
    path: PathBuf,
}

impl AuthSession {
    pub fn in_memory() -> Self {
        Self {
            token: Arc::new(RwLock::new(None)),
            path: PathBuf::new(),
        }
    }

    /// Loads the persisted token, starting empty when the file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        let token = match std::fs::read_to_string(path) {
            Ok(raw) => {
                let stored: StoredSession = serde_json::from_str(&raw)
                    .with_context(|| format!("invalid session file {}", path.display()))?;
                stored.token.filter(|token| !token.trim().is_empty())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", path.display()))
            }
        };
        Ok(Self {
            token: Arc::new(RwLock::new(token)),
            path: path.to_path_buf(),
        })
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.token().is_some()
    }

    pub fn set_token(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into().trim().to_string();
        self.replace(if token.is_empty() { None } else { Some(token) })
    }

    pub fn clear(&self) -> Result<()> {
        self.replace(None)
    }

    fn replace(&self, token: Option<String>) -> Result<()> {
        match self.token.write() {
            Ok(mut guard) => *guard = token.clone(),
            Err(poisoned) => *poisoned.into_inner() = token.clone(),
        }
        self.persist(token)
    }

    fn persist(&self, token: Option<String>) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(&StoredSession { token })?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

/// Counts background operations so the UI can show one global busy state.
#[derive(Clone, Debug, Default)]
pub struct LoadingController {
    active: Arc<AtomicUsize>,
}

impl LoadingController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> LoadingGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        LoadingGuard {
            active: self.active.clone(),
        }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn is_busy(&self) -> bool {
        self.active() > 0
    }
}

/// Held by a running operation; dropping it marks the operation finished.
#[derive(Debug)]
pub struct LoadingGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
