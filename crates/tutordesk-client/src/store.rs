//! The credential store: single owner of tokens and the principal hint.

use std::fmt;
use std::sync::{Arc, RwLock};

use tutordesk_core::{AccessToken, Credentials, RefreshToken, TokenPair};

/// A guarded mutable cell holding the current tokens and, optionally, the
/// username/password pair used at login (the principal hint).
///
/// All other components read snapshots or request mutation through this
/// store; none holds a private token copy that could outlive a
/// [`clear`](CredentialStore::clear). Cheap to clone; clones share the same
/// cell.
#[derive(Clone, Default)]
pub struct CredentialStore {
    inner: Arc<RwLock<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    access: Option<AccessToken>,
    refresh: Option<RefreshToken>,
    principal: Option<Credentials>,
    generation: u64,
}

impl CredentialStore {
    /// Create an empty (unauthenticated) store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current token snapshot. No side effects.
    pub fn snapshot(&self) -> TokenPair {
        let inner = self.inner.read().unwrap();
        TokenPair {
            access: inner.access.clone(),
            refresh: inner.refresh.clone(),
        }
    }

    /// Replace both tokens atomically. Visible to all readers on return.
    pub fn set(&self, access: AccessToken, refresh: Option<RefreshToken>) {
        let mut inner = self.inner.write().unwrap();
        inner.access = Some(access);
        inner.refresh = refresh;
        inner.generation += 1;
    }

    /// Cache the username/password pair for re-login fallback.
    pub fn set_principal(&self, credentials: Credentials) {
        let mut inner = self.inner.write().unwrap();
        inner.principal = Some(credentials);
    }

    /// Returns the cached principal hint, if any.
    pub fn principal(&self) -> Option<Credentials> {
        self.inner.read().unwrap().principal.clone()
    }

    /// Wipe tokens and principal. Subsequent snapshots report the
    /// unauthenticated sentinel.
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.access = None;
        inner.refresh = None;
        inner.principal = None;
        inner.generation += 1;
    }

    /// True if an access token is present.
    pub fn is_authenticated(&self) -> bool {
        self.inner.read().unwrap().access.is_some()
    }

    /// Counter incremented by every [`set`](Self::set) and
    /// [`clear`](Self::clear).
    ///
    /// The gateway records the generation before a request and compares it
    /// while waiting at the refresh gate: if it moved, another request
    /// already settled the renewal and a second refresh call must not be
    /// made.
    pub fn generation(&self) -> u64 {
        self.inner.read().unwrap().generation
    }
}

// Never expose token material through Debug
impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read().unwrap();
        f.debug_struct("CredentialStore")
            .field("authenticated", &inner.access.is_some())
            .field("generation", &inner.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unauthenticated() {
        let store = CredentialStore::new();
        assert!(!store.is_authenticated());
        assert!(store.snapshot().access.is_none());
        assert!(store.principal().is_none());
    }

    #[test]
    fn set_is_visible_to_clones() {
        let store = CredentialStore::new();
        let reader = store.clone();
        store.set(AccessToken::new("t1"), Some(RefreshToken::new("r1")));
        let snapshot = reader.snapshot();
        assert_eq!(snapshot.access.unwrap().as_str(), "t1");
        assert_eq!(snapshot.refresh.unwrap().as_str(), "r1");
    }

    #[test]
    fn clear_wipes_everything() {
        let store = CredentialStore::new();
        store.set(AccessToken::new("t1"), Some(RefreshToken::new("r1")));
        store.set_principal(Credentials::new("admin", "pw"));
        store.clear();
        assert!(!store.is_authenticated());
        assert!(store.snapshot().refresh.is_none());
        assert!(store.principal().is_none());
    }

    #[test]
    fn generation_advances_on_set_and_clear() {
        let store = CredentialStore::new();
        let g0 = store.generation();
        store.set(AccessToken::new("t1"), None);
        let g1 = store.generation();
        assert!(g1 > g0);
        store.clear();
        assert!(store.generation() > g1);
    }

    #[test]
    fn debug_hides_tokens() {
        let store = CredentialStore::new();
        store.set(AccessToken::new("super-secret"), None);
        let debug = format!("{:?}", store);
        assert!(!debug.contains("super-secret"));
    }
}
