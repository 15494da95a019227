use std::collections::HashMap;
use std::fmt::Write as _;
use std::time::{Duration, Instant};

use rand::RngCore;
use tokio::sync::RwLock;
use tracing::debug;

use super::dto::SessionUser;

/// Server-held session table keyed by an opaque token. Constructed once and
/// injected through `AppState`; nothing here is process-global.
pub struct SessionStore {
    ttl: Duration,
    inner: RwLock<HashMap<String, SessionEntry>>,
}

struct SessionEntry {
    user: SessionUser,
    expires_at: Instant,
}

/// 256-bit random token, hex-encoded.
fn generate_token() -> String {
    let mut buf = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    let mut token = String::with_capacity(64);
    for b in &buf {
        let _ = write!(&mut token, "{:02x}", b);
    }
    token
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a fresh session for the given identity and return its token.
    pub async fn issue(&self, user: SessionUser) -> String {
        let token = generate_token();
        let entry = SessionEntry {
            user,
            expires_at: Instant::now() + self.ttl,
        };
        debug!(user_id = entry.user.id, "session issued");
        self.inner.write().await.insert(token.clone(), entry);
        token
    }

    /// Look up the identity behind a token. Expired entries are dropped on
    /// sight and report as absent.
    pub async fn validate(&self, token: &str) -> Option<SessionUser> {
        let now = Instant::now();
        {
            let map = self.inner.read().await;
            match map.get(token) {
                Some(entry) if entry.expires_at > now => return Some(entry.user.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.inner.write().await.remove(token);
        None
    }

    /// Drop a session. Unknown tokens are a no-op, which makes logout
    /// idempotent.
    pub async fn revoke(&self, token: &str) -> bool {
        self.inner.write().await.remove(token).is_some()
    }
}
