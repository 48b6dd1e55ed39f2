//! Blob storage for uploaded bytes and HMAC-signed retrieval URLs.

use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Component, Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

/// Blob storage failure.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The key is empty or escapes the storage root.
    #[error("invalid blob path: {0}")]
    InvalidPath(String),
    /// No blob is stored under the key.
    #[error("blob not found")]
    NotFound,
    /// Filesystem failure.
    #[error("blob i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// A thread panicked while holding the store lock.
    #[error("blob store lock poisoned")]
    Poisoned,
}

/// Keyed byte storage.
pub trait BlobStore: Send + Sync {
    /// Writes bytes under `path`, replacing any previous blob.
    fn put(&self, path: &str, bytes: &[u8]) -> Result<(), BlobError>;
    /// Reads the bytes stored under `path`.
    fn get(&self, path: &str) -> Result<Vec<u8>, BlobError>;
    /// Removes the blob; removing a missing blob succeeds.
    fn delete(&self, path: &str) -> Result<(), BlobError>;
}

/// Replaces every byte outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_segment(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.trim_matches('.') {
        "" => "file".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Key for one uploaded file: `session-uploads/<session>/<record>-<filename>`.
pub fn upload_path(session_id: &str, record_id: &str, filename: &str) -> String {
    format!(
        "session-uploads/{}/{}-{}",
        sanitize_segment(session_id),
        sanitize_segment(record_id),
        sanitize_segment(filename)
    )
}

/// Filesystem blob store rooted at one directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Creates the root directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, BlobError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, BlobError> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(BlobError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl BlobStore for LocalBlobStore {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<(), BlobError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(target, bytes)?;
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Vec<u8>, BlobError> {
        match std::fs::read(self.resolve(path)?) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(BlobError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    fn delete(&self, path: &str) -> Result<(), BlobError> {
        match std::fs::remove_file(self.resolve(path)?) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory blob store for tests.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.lock().map_or(0, |blobs| blobs.len())
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<(), BlobError> {
        self.blobs
            .lock()
            .map_err(|_| BlobError::Poisoned)?
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Vec<u8>, BlobError> {
        self.blobs
            .lock()
            .map_err(|_| BlobError::Poisoned)?
            .get(path)
            .cloned()
            .ok_or(BlobError::NotFound)
    }

    fn delete(&self, path: &str) -> Result<(), BlobError> {
        self.blobs
            .lock()
            .map_err(|_| BlobError::Poisoned)?
            .remove(path);
        Ok(())
    }
}

type HmacSha256 = Hmac<Sha256>;

/// Issues and checks expiring blob URLs.
pub struct UrlSigner {
    key: Vec<u8>,
    ttl: Duration,
}

impl UrlSigner {
    /// Creates a signer with an HMAC key and URL lifetime.
    pub fn new(key: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            ttl,
        }
    }

    fn mac(&self, path: &str, expires: i64) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key).ok()?;
        mac.update(format!("{path}\n{expires}").as_bytes());
        Some(mac)
    }

    fn signature(&self, path: &str, expires: i64) -> String {
        self.mac(path, expires)
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
            .unwrap_or_default()
    }

    /// Returns `/api/blobs/<path>?expires=<unix>&signature=<hex>` valid from `now` for the TTL.
    pub fn signed_url(&self, path: &str, now: i64) -> String {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let expires = now.saturating_add(ttl);
        format!(
            "/api/blobs/{path}?expires={expires}&signature={}",
            self.signature(path, expires)
        )
    }

    /// Whether `signature` matches `path` and `expires` is not in the past.
    pub fn verify(&self, path: &str, expires: i64, signature: &str, now: i64) -> bool {
        if now > expires {
            return false;
        }
        let (Ok(signature), Some(mac)) = (hex::decode(signature), self.mac(path, expires)) else {
            return false;
        };
        mac.verify_slice(&signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(url: &str) -> (String, i64, String) {
        let (path, query) = url.split_once('?').expect("query");
        let mut expires = 0;
        let mut signature = String::new();
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("expires", value)) => expires = value.parse().expect("expires"),
                Some(("signature", value)) => signature = value.to_string(),
                _ => {}
            }
        }
        let path = path.trim_start_matches("/api/blobs/").to_string();
        (path, expires, signature)
    }

    #[test]
    fn signatures_are_hex_encoded_sha256_macs() {
        let signer = UrlSigner::new(b"key".to_vec(), Duration::from_secs(60));
        let (_, _, signature) = query(&signer.signed_url("a/b", 0));
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert!(!signer.verify("a/b", 60, "not-hex", 0));
        assert!(!signer.verify("a/b", 60, &signature[..62], 0));
    }

    #[test]
    fn signed_urls_verify_until_expiry() {
        let signer = UrlSigner::new(b"key".to_vec(), Duration::from_secs(900));
        let url = signer.signed_url("session-uploads/s/1-a.txt", 1_000);
        let (path, expires, signature) = query(&url);
        assert_eq!(expires, 1_900);
        assert!(signer.verify(&path, expires, &signature, 1_900));
        assert!(!signer.verify(&path, expires, &signature, 1_901));
    }

    #[test]
    fn tampering_breaks_the_signature() {
        let signer = UrlSigner::new(b"key".to_vec(), Duration::from_secs(900));
        let (path, expires, signature) = query(&signer.signed_url("a/b", 0));
        assert!(!signer.verify("a/c", expires, &signature, 0));
        assert!(!signer.verify(&path, expires + 60, &signature, 0));
        let other = UrlSigner::new(b"other".to_vec(), Duration::from_secs(900));
        assert!(!other.verify(&path, expires, &signature, 0));
    }

    #[test]
    fn upload_paths_are_sanitised() {
        assert_eq!(
            upload_path("s/../1", "rec", "../../etc/passwd"),
            "session-uploads/s_.._1/rec-_.._etc_passwd"
        );
        assert_eq!(sanitize_segment("..."), "file");
    }

    #[test]
    fn local_store_round_trips_and_rejects_escapes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalBlobStore::new(dir.path().join("blobs")).expect("store");
        store.put("session-uploads/s/1-a.txt", b"abc").expect("put");
        assert_eq!(store.get("session-uploads/s/1-a.txt").expect("get"), b"abc");
        store.delete("session-uploads/s/1-a.txt").expect("delete");
        store.delete("session-uploads/s/1-a.txt").expect("delete missing");
        assert!(matches!(
            store.get("session-uploads/s/1-a.txt"),
            Err(BlobError::NotFound)
        ));
        assert!(matches!(
            store.put("../escape", b"x"),
            Err(BlobError::InvalidPath(_))
        ));
        assert!(matches!(store.get("/etc/passwd"), Err(BlobError::InvalidPath(_))));
    }
}
