//! Process-wide access-token denylist
//!
//! Access tokens are stateless and individually irrevocable; their short
//! lifetime is the revocation mechanism. The one exception is explicit
//! logout: the presented token's jti is denied for its remaining lifetime
//! so it stops working immediately. Entries expire with the tokens they
//! deny, so the map stays bounded by the access-token TTL.

use chrono::{DateTime, TimeZone, Utc};
use dashmap::DashMap;
use uuid::Uuid;

/// In-process jti denylist
#[derive(Debug, Default)]
pub struct AccessDenylist {
    entries: DashMap<Uuid, DateTime<Utc>>,
}

impl AccessDenylist {
    /// Create an empty denylist
    pub fn new() -> Self {
        Self::default()
    }

    /// Deny a token ID until `exp` (seconds timestamp).
    ///
    /// Already-expired tokens are not recorded; they fail verification on
    /// their own.
    pub fn insert(&self, jti: Uuid, exp: i64, now: DateTime<Utc>) {
        let Some(expires_at) = Utc.timestamp_opt(exp, 0).single() else {
            return;
        };
        if expires_at <= now {
            return;
        }
        self.prune(now);
        self.entries.insert(jti, expires_at);
    }

    /// Check whether a token ID is currently denied.
    pub fn contains(&self, jti: &Uuid, now: DateTime<Utc>) -> bool {
        let live = match self.entries.get(jti) {
            Some(entry) => *entry.value() > now,
            None => return false,
        };
        if !live {
            // guard dropped above; safe to take the shard write lock
            self.entries.remove_if(jti, |_, expires_at| *expires_at <= now);
        }
        live
    }

    /// Number of live entries (stale ones included until pruned)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the denylist holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn prune(&self, now: DateTime<Utc>) {
        self.entries.retain(|_, expires_at| *expires_at > now);
    }
}
