// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

/// Storage for at most one opaque bearer token. The token is set on
/// successful login, cleared on logout or rejection, and read by every
/// authenticated call. No validation of the token shape is performed.
pub trait CredentialStore {
    fn set(&self, token: &str) -> Result<()>;

    /// Returns the stored token, or None when unauthenticated. An empty or
    /// unreadable token counts as absent.
    fn get(&self) -> Option<String>;

    fn clear(&self) -> Result<()>;
}

/// Token persisted in a single file under the platform config directory, so
/// a session survives process restarts. Absence of the file means
/// unauthenticated.
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("TICKLIST_TOKEN_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set TICKLIST_TOKEN_PATH to the token file")
        })?;
        Ok(config_root.join("ticklist").join("token"))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl CredentialStore for TokenFile {
    fn set(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create token directory {}", parent.display()))?;
        }
        fs::write(&self.path, token)
            .with_context(|| format!("write token file {}", self.path.display()))
    }

    fn get(&self) -> Option<String> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let token = raw.trim();
        if token.is_empty() {
            return None;
        }
        Some(token.to_owned())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => {
                Err(error).with_context(|| format!("remove token file {}", self.path.display()))
            }
        }
    }
}

/// Process-local store for tests and embedding contexts that must not touch
/// the filesystem.
#[derive(Debug, Default)]
pub struct MemoryStore {
    token: Mutex<Option<String>>,
}

impl CredentialStore for MemoryStore {
    fn set(&self, token: &str) -> Result<()> {
        let mut slot = self
            .token
            .lock()
            .map_err(|_| anyhow!("credential store poisoned"))?;
        *slot = Some(token.to_owned());
        Ok(())
    }

    fn get(&self) -> Option<String> {
        let slot = self.token.lock().ok()?;
        slot.clone().filter(|token| !token.is_empty())
    }

    fn clear(&self) -> Result<()> {
        let mut slot = self
            .token
            .lock()
            .map_err(|_| anyhow!("credential store poisoned"))?;
        *slot = None;
        Ok(())
    }
}
