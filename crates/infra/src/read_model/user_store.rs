use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use orgscope_auth::UserRecord;
use orgscope_core::{DomainError, DomainResult, UserId};

/// Persistent user records. Email addresses are unique (case-normalised by the caller).
pub trait UserStore: Send + Sync {
    fn get(&self, id: &UserId) -> Option<UserRecord>;
    fn find_by_email(&self, email: &str) -> Option<UserRecord>;
    fn list(&self) -> Vec<UserRecord>;
    /// Add a new record; fails on a duplicate id or email.
    fn insert(&self, record: UserRecord) -> DomainResult<()>;
    /// Replace an existing record; fails if it is missing or the email belongs to someone else.
    fn update(&self, record: UserRecord) -> DomainResult<()>;
    fn remove(&self, id: &UserId) -> Option<UserRecord>;
}

impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    fn get(&self, id: &UserId) -> Option<UserRecord> {
        (**self).get(id)
    }

    fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        (**self).find_by_email(email)
    }

    fn list(&self) -> Vec<UserRecord> {
        (**self).list()
    }

    fn insert(&self, record: UserRecord) -> DomainResult<()> {
        (**self).insert(record)
    }

    fn update(&self, record: UserRecord) -> DomainResult<()> {
        (**self).update(record)
    }

    fn remove(&self, id: &UserId) -> Option<UserRecord> {
        (**self).remove(id)
    }
}

/// In-memory user store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<HashMap<UserId, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn email_taken(map: &HashMap<UserId, UserRecord>, email: &str, except: &UserId) -> bool {
        map.values().any(|u| u.id != *except && u.email == email)
    }
}

impl UserStore for InMemoryUserStore {
    fn get(&self, id: &UserId) -> Option<UserRecord> {
        let map = self.inner.read().ok()?;
        map.get(id).cloned()
    }

    fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        let normalized = email.trim().to_lowercase();
        let map = self.inner.read().ok()?;
        map.values().find(|u| u.email == normalized).cloned()
    }

    fn list(&self) -> Vec<UserRecord> {
        match self.inner.read() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    fn insert(&self, record: UserRecord) -> DomainResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::invariant("user store lock poisoned"))?;
        if map.contains_key(&record.id) {
            return Err(DomainError::conflict(format!("user {} already exists", record.id)));
        }
        if Self::email_taken(&map, &record.email, &record.id) {
            return Err(DomainError::conflict("email already in use"));
        }
        map.insert(record.id, record);
        Ok(())
    }

    fn update(&self, record: UserRecord) -> DomainResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::invariant("user store lock poisoned"))?;
        if !map.contains_key(&record.id) {
            return Err(DomainError::not_found(format!("user {}", record.id)));
        }
        if Self::email_taken(&map, &record.email, &record.id) {
            return Err(DomainError::conflict("email already in use"));
        }
        map.insert(record.id, record);
        Ok(())
    }

    fn remove(&self, id: &UserId) -> Option<UserRecord> {
        let mut map = self.inner.write().ok()?;
        map.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgscope_auth::Role;
    use orgscope_core::NodeId;

    fn record(email: &str) -> UserRecord {
        UserRecord {
            id: UserId::new(),
            email: email.to_string(),
            name: "Someone".to_string(),
            role: Role::Employee,
            node_id: NodeId::new(),
        }
    }

    #[test]
    fn emails_are_unique_across_insert_and_update() {
        let store = InMemoryUserStore::new();
        let alice = record("alice@example.com");
        let bob = record("bob@example.com");
        store.insert(alice.clone()).unwrap();
        store.insert(bob.clone()).unwrap();

        assert!(matches!(
            store.insert(record("alice@example.com")),
            Err(DomainError::Conflict(_))
        ));

        let stolen = UserRecord {
            email: alice.email.clone(),
            ..bob.clone()
        };
        assert!(matches!(store.update(stolen), Err(DomainError::Conflict(_))));

        // Keeping one's own email is not a conflict.
        let renamed = UserRecord {
            name: "Alice A.".into(),
            ..alice.clone()
        };
        store.update(renamed).unwrap();
        assert_eq!(store.find_by_email(" ALICE@example.com ").unwrap().name, "Alice A.");
    }

    #[test]
    fn update_and_remove_missing() {
        let store = InMemoryUserStore::new();
        let ghost = record("ghost@example.com");
        assert!(matches!(store.update(ghost.clone()), Err(DomainError::NotFound(_))));
        assert!(store.remove(&ghost.id).is_none());
        assert!(store.list().is_empty());
    }
}
