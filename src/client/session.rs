use super::storage::{SessionStorage, TOKEN_KEY};
use super::ClientError;
use crate::models::UserSummary;

/// Current token and user, with the token mirrored to durable storage.
///
/// `is_logged_in` is recomputed on every token change and always equals token presence.
/// The user is only known after a login in this process; a hydrated session has a
/// token but no user.
pub struct SessionStore {
    storage: Box<dyn SessionStorage>,
    token: Option<String>,
    user: Option<UserSummary>,
    logged_in: bool,
}

impl SessionStore {
    pub fn new(storage: impl SessionStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            token: None,
            user: None,
            logged_in: false,
        }
    }

    fn set_token(&mut self, token: Option<String>) {
        self.token = token;
        self.logged_in = self.token.is_some();
    }

    /// Picks up a token left in durable storage by an earlier run.
    pub fn initialize(&mut self) -> Result<(), ClientError> {
        if let Some(token) = self.storage.get(TOKEN_KEY)? {
            self.set_token(Some(token));
        }
        Ok(())
    }

    pub fn establish(&mut self, token: String, user: UserSummary) -> Result<(), ClientError> {
        self.storage.set(TOKEN_KEY, &token)?;
        self.set_token(Some(token));
        self.user = Some(user);
        Ok(())
    }

    /// Drops the session. Memory is cleared even when durable storage fails.
    pub fn clear(&mut self) -> Result<(), ClientError> {
        self.set_token(None);
        self.user = None;
        self.storage.remove(TOKEN_KEY)
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&UserSummary> {
        self.user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::storage::MemoryStorage;
    use std::sync::Arc;

    /// Lets a test inspect the storage a `SessionStore` owns.
    #[derive(Clone, Default)]
    struct Shared(Arc<MemoryStorage>);

    impl SessionStorage for Shared {
        fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
            self.0.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
            self.0.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), ClientError> {
            self.0.remove(key)
        }
    }

    fn user() -> UserSummary {
        UserSummary {
            id: 1,
            email: "a@x.com".into(),
        }
    }

    #[test]
    fn test_establish_and_clear() {
        let storage = Shared::default();
        let mut session = SessionStore::new(storage.clone());
        assert!(!session.is_logged_in());

        session.establish("tok".into(), user()).unwrap();
        assert!(session.is_logged_in());
        assert_eq!(session.token(), Some("tok"));
        assert_eq!(session.user(), Some(&user()));
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("tok"));

        session.clear().unwrap();
        assert!(!session.is_logged_in());
        assert_eq!(session.token(), None);
        assert_eq!(session.user(), None);
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_initialize_hydrates_token_only() {
        let storage = Shared::default();
        storage.set(TOKEN_KEY, "persisted").unwrap();

        let mut session = SessionStore::new(storage);
        session.initialize().unwrap();
        assert!(session.is_logged_in());
        assert_eq!(session.token(), Some("persisted"));
        assert_eq!(session.user(), None);
    }

    #[test]
    fn test_initialize_without_stored_token() {
        let mut session = SessionStore::new(MemoryStorage::new());
        session.initialize().unwrap();
        assert!(!session.is_logged_in());
    }
}
