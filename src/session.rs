use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{field, id_string};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
}

/// Bearer credential plus the minimal profile needed for ownership checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

impl Session {
    /// Normalize an auth response (or a previously persisted blob). Auth
    /// backends nest the token and profile at several levels; all tolerated
    /// shapes are probed here and nowhere else.
    pub fn from_value(v: &Value) -> Option<Session> {
        let token = field(v, &["token", "accessToken"])
            .or_else(|| v.get("data").and_then(|d| field(d, &["token", "accessToken"])))
            .or_else(|| v.get("user").and_then(|u| u.get("token")))
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())?
            .to_string();
        let profile = v
            .get("user")
            .or_else(|| v.get("data").and_then(|d| d.get("user")))
            .or_else(|| v.get("data"))
            .unwrap_or(v);
        let user = UserProfile {
            id: field(profile, &["_id", "id"]).and_then(id_string).unwrap_or_default(),
            name: field(profile, &["name", "username"])
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        };
        Some(Session { token, user })
    }
}

/// File-backed session persistence, the analog of the browser's local
/// storage. Every caller re-reads at use time; nothing caches the token.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Option<Session> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) => {
                debug!("no session at '{}': {e}", self.path.display());
                return None;
            }
        };
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(v) => Session::from_value(&v),
            Err(e) => {
                warn!("unreadable session file '{}': {e}", self.path.display());
                None
            }
        }
    }

    pub fn save(&self, session: &Session) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let bytes = serde_json::to_vec_pretty(session)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, bytes)
    }

    /// Best-effort removal; a missing file is already the desired state.
    pub fn clear(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("failed to clear session '{}': {e}", self.path.display());
            }
        }
    }

    pub fn bearer_token(&self) -> Option<String> {
        self.load().map(|s| s.token)
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.load().map(|s| s.user)
    }
}
