use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use orgscope_core::{DomainError, DomainResult, UserId};

/// Where user secrets live. Hashing is the implementation's concern; callers
/// only hand over validated plaintext.
pub trait CredentialStore: Send + Sync {
    fn set_password(&self, user_id: UserId, password: &str) -> DomainResult<()>;
    fn verify(&self, user_id: &UserId, password: &str) -> bool;
    fn remove(&self, user_id: &UserId);
}

impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore + ?Sized,
{
    fn set_password(&self, user_id: UserId, password: &str) -> DomainResult<()> {
        (**self).set_password(user_id, password)
    }

    fn verify(&self, user_id: &UserId, password: &str) -> bool {
        (**self).verify(user_id, password)
    }

    fn remove(&self, user_id: &UserId) {
        (**self).remove(user_id)
    }
}

/// In-memory credential store for tests/dev. Secrets are kept verbatim.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<HashMap<UserId, String>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn set_password(&self, user_id: UserId, password: &str) -> DomainResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::invariant("credential store lock poisoned"))?;
        map.insert(user_id, password.to_string());
        Ok(())
    }

    fn verify(&self, user_id: &UserId, password: &str) -> bool {
        self.inner
            .read()
            .map(|map| map.get(user_id).is_some_and(|stored| stored == password))
            .unwrap_or(false)
    }

    fn remove(&self, user_id: &UserId) {
        if let Ok(mut map) = self.inner.write() {
            map.remove(user_id);
        }
    }
}
