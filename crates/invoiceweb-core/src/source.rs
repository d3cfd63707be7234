//! Data-access and authentication seams

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{CoreError, CoreResult};
use crate::models::{Record, Registration};
use crate::types::RecordId;

/// Data source reference type
pub type SourceRef<R> = Arc<dyn DataSource<R>>;

/// Access to one collection of records
#[async_trait]
pub trait DataSource<R: Record>: Send + Sync {
    /// Fetch the full collection
    async fn find_all(&self) -> CoreResult<Vec<R>>;

    /// Fetch one record
    async fn find(&self, id: RecordId) -> CoreResult<R>;

    async fn delete(&self, id: RecordId) -> CoreResult<()>;

    async fn create(&self, draft: &R::Draft) -> CoreResult<R>;

    async fn update(&self, id: RecordId, draft: &R::Draft) -> CoreResult<R>;
}

/// Session gate for private pages
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> CoreResult<()>;

    /// Create a user account; the new user still has to log in
    async fn register(&self, registration: &Registration) -> CoreResult<()>;

    fn logout(&self);

    fn is_authenticated(&self) -> bool;
}

const HASH_COST: u32 = 10;

/// Authenticator checking credentials from the configuration and the
/// accounts registered since startup.
/// Without credentials every visitor is authenticated.
#[derive(Debug)]
pub struct StaticAuthenticator {
    credentials: Option<(String, String)>,
    /// email -> bcrypt hash
    accounts: RwLock<HashMap<String, String>>,
    authenticated: AtomicBool,
}

impl StaticAuthenticator {
    pub fn new(credentials: Option<(String, String)>) -> Self {
        Self {
            credentials,
            accounts: RwLock::new(HashMap::new()),
            authenticated: AtomicBool::new(false),
        }
    }

    pub fn open() -> Self {
        Self::new(None)
    }

    fn account_matches(&self, username: &str, password: &str) -> bool {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(username)
            .is_some_and(|hash| bcrypt::verify(password, hash).unwrap_or(false))
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn login(&self, username: &str, password: &str) -> CoreResult<()> {
        match &self.credentials {
            Some((user, pass)) if user == username && pass == password => {}
            Some(_) if self.account_matches(username, password) => {}
            Some(_) => {
                log::warn!(target: "invoiceweb::auth", "Rejected login for '{}'", username);
                return Err(CoreError::Unauthorized);
            }
            None => return Ok(()),
        }
        self.authenticated.store(true, Ordering::SeqCst);
        log::info!(target: "invoiceweb::auth", "User '{}' logged in", username);
        Ok(())
    }

    async fn register(&self, registration: &Registration) -> CoreResult<()> {
        registration.validate()?;
        let username = registration.username();
        let hash = bcrypt::hash(&registration.password, HASH_COST).map_err(|e| CoreError::Validation {
            field: "password".to_string(),
            message: e.to_string(),
        })?;

        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        let configured = self.credentials.as_ref().is_some_and(|(user, _)| user == username);
        if configured || accounts.contains_key(username) {
            return Err(CoreError::Validation {
                field: "email".to_string(),
                message: "email address is already registered".to_string(),
            });
        }
        accounts.insert(username.to_string(), hash);
        log::info!(target: "invoiceweb::auth", "Registered account '{}'", username);
        Ok(())
    }

    fn logout(&self) {
        self.authenticated.store(false, Ordering::SeqCst);
    }

    fn is_authenticated(&self) -> bool {
        self.credentials.is_none() || self.authenticated.load(Ordering::SeqCst)
    }
}
