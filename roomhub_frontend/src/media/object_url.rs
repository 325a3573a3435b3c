use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

pub const OBJECT_URL_SCHEME: &str = "blob:roomhub/";

/// Bytes registered behind an object URL.
#[derive(Clone)]
pub struct Blob {
    pub mime: String,
    pub bytes: Arc<[u8]>,
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Process-wide registry of in-memory blobs addressable by `blob:` URLs.
///
/// URLs are handed out as [`ObjectUrl`] guards; the blob stays resolvable
/// until its guard is dropped.
#[derive(Clone, Default)]
pub struct ObjectUrlStore {
    blobs: Arc<Mutex<HashMap<String, Blob>>>,
}

impl ObjectUrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, mime: impl Into<String>, bytes: Arc<[u8]>) -> ObjectUrl {
        let url = format!("{OBJECT_URL_SCHEME}{}", Uuid::new_v4());
        let blob = Blob {
            mime: mime.into(),
            bytes,
        };
        self.lock().insert(url.clone(), blob);
        ObjectUrl {
            url,
            store: self.clone(),
        }
    }

    pub fn resolve(&self, url: &str) -> Option<Blob> {
        self.lock().get(url).cloned()
    }

    /// Number of URLs currently alive.
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn revoke(&self, url: &str) {
        if self.lock().remove(url).is_some() {
            log::debug!("revoked object URL {url}");
        }
    }

    // A poisoned map still holds valid entries; keep serving them.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Blob>> {
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub fn is_object_url(url: &str) -> bool {
    url.starts_with(OBJECT_URL_SCHEME)
}

/// Owning handle to one object URL. Dropping it revokes the URL.
pub struct ObjectUrl {
    url: String,
    store: ObjectUrlStore,
}

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn blob(&self) -> Option<Blob> {
        self.store.resolve(&self.url)
    }
}

impl fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectUrl").field(&self.url).finish()
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.store.revoke(&self.url);
    }
}
