//! On-disk session state: `{data_dir}/session.json`.
//!
//! Holds the last credential and the exported cookie jar so that a new
//! process can resume the session. The file is written with owner-only
//! permissions on unix. Clones share one writer, so the credential and the
//! cookie jar never overwrite each other's updates.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use tripmate_core::credential::CredentialPersistence;
use tripmate_types::credential::Credential;
use tripmate_types::error::StoreError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<Credential>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
    writer: Arc<Mutex<()>>,
}

impl SessionFile {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("session.json"),
            writer: Arc::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<SessionState, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SessionState::default()),
            Err(e) => return Err(StoreError::Io(format!("{}: {e}", self.path.display()))),
        };
        serde_json::from_str(&content)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    /// Replace the stored cookies, keeping the credential.
    pub fn save_cookies(&self, cookies: Option<String>) -> Result<(), StoreError> {
        self.update(|state| state.cookies = cookies)
    }

    /// Read-modify-write under the shared writer lock.
    fn update(&self, apply: impl FnOnce(&mut SessionState)) -> Result<(), StoreError> {
        let _writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut state = self.read().unwrap_or_default();
        apply(&mut state);
        self.replace_file(&state)
    }

    fn replace_file(&self, state: &SessionState) -> Result<(), StoreError> {
        if state.credential.is_none() && state.cookies.is_none() {
            return match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(StoreError::Io(e.to_string())),
            };
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        // Write a fresh owner-only sibling, then rename it over the old file.
        let staging = self.path.with_extension("json.tmp");
        let mut file = create_private(&staging).map_err(|e| StoreError::Io(e.to_string()))?;
        file.write_all(json.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| StoreError::Io(e.to_string()))?;
        std::fs::rename(&staging, &self.path).map_err(|e| StoreError::Io(e.to_string()))
    }
}

fn create_private(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    // A leftover staging file keeps its old mode; start from scratch.
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    options.open(path)
}

impl CredentialPersistence for SessionFile {
    fn load(&self) -> Result<Option<Credential>, StoreError> {
        Ok(self.read()?.credential)
    }

    fn save(&self, credential: Option<&Credential>) -> Result<(), StoreError> {
        self.update(|state| state.credential = credential.cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty_state() {
        let tmp = TempDir::new().unwrap();
        let file = SessionFile::new(tmp.path());
        assert_eq!(file.read().unwrap(), SessionState::default());
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn credential_and_cookies_are_kept_independently() {
        let tmp = TempDir::new().unwrap();
        let file = SessionFile::new(tmp.path());

        file.save(Some(&Credential::new("tok", Some("a@b.c".to_string()))))
            .unwrap();
        file.save_cookies(Some("refreshToken=r1".to_string())).unwrap();

        let state = file.read().unwrap();
        assert_eq!(state.credential.unwrap().access_token, "tok");
        assert_eq!(state.cookies.as_deref(), Some("refreshToken=r1"));

        file.save(None).unwrap();
        let state = file.read().unwrap();
        assert!(state.credential.is_none());
        assert_eq!(state.cookies.as_deref(), Some("refreshToken=r1"));
    }

    #[test]
    fn empty_state_removes_file() {
        let tmp = TempDir::new().unwrap();
        let file = SessionFile::new(tmp.path());
        file.save(Some(&Credential::new("tok", None))).unwrap();
        assert!(file.path().exists());

        file.save(None).unwrap();
        assert!(!file.path().exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let tmp = TempDir::new().unwrap();
        let file = SessionFile::new(tmp.path());
        std::fs::write(file.path(), "{nope").unwrap();
        assert!(matches!(file.read(), Err(StoreError::Corrupt(_))));
    }

    #[cfg(unix)]
    #[test]
    fn file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let file = SessionFile::new(tmp.path());
        file.save(Some(&Credential::new("tok", None))).unwrap();
        let mode = std::fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn loose_existing_file_is_replaced_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let file = SessionFile::new(tmp.path());
        std::fs::write(file.path(), "{}").unwrap();
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o644)).unwrap();

        file.save_cookies(Some("refreshToken=r1".to_string())).unwrap();

        let mode = std::fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!file.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn concurrent_writers_keep_both_fields() {
        let tmp = TempDir::new().unwrap();
        let file = SessionFile::new(tmp.path());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let file = file.clone();
                std::thread::spawn(move || {
                    for round in 0..10 {
                        if i % 2 == 0 {
                            let token = format!("tok-{i}-{round}");
                            file.save(Some(&Credential::new(token, None))).unwrap();
                        } else {
                            file.save_cookies(Some(format!("refreshToken=r{i}-{round}")))
                                .unwrap();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let state = file.read().unwrap();
        assert!(state.credential.is_some());
        assert!(state.cookies.is_some());
    }
}
