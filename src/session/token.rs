//! Durable token store.
//!
//! Exactly one key survives restarts: the opaque session token. It is written
//! by login/signup, cleared by logout, and read on every outbound request.

use std::path::PathBuf;

use tracing::debug;

use crate::error::Result;

/// File-backed store for the session token.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The current token, or `None` when logged out. An empty or
    /// whitespace-only file counts as no token.
    pub fn current(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(_) => None,
        }
    }

    /// Persist a new token, replacing any previous one.
    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        debug!("session token stored at {}", self.path.display());
        Ok(())
    }

    /// Remove the stored token. Subsequent requests carry no Authorization.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token"));

        assert_eq!(store.current(), None);

        store.save("abc123").unwrap();
        assert_eq!(store.current(), Some("abc123".to_string()));

        store.save("def456").unwrap();
        assert_eq!(store.current(), Some("def456".to_string()));

        store.clear().unwrap();
        assert_eq!(store.current(), None);

        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_blank_file_is_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token"));
        store.save("  \n").unwrap();
        assert_eq!(store.current(), None);
    }
}
