//! Password authentication and session identity
//!
//! Accounts are stored in the [`DocumentStore`]; passwords are hashed with
//! bcrypt. A successful register or login opens a session in the
//! [`SessionStore`], whose key travels back to the client as a cookie.

mod session;

pub use session::{Session, SessionStore};

use bcrypt::{hash, verify};
use thiserror::Error;

use crate::store::{DocumentStore, StoreError};
use crate::types::{new_id, Role, User};

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Username is required")]
    MissingUsername,
    #[error("Password must be at least {MIN_PASSWORD_LEN} characters long")]
    WeakPassword,
    #[error("Username already exists")]
    UsernameTaken,
    #[error("Hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UsernameTaken => AuthError::UsernameTaken,
        }
    }
}

/// Registers and authenticates accounts against the document store
#[derive(Debug, Clone)]
pub struct Authenticator {
    bcrypt_cost: u32,
}

impl Authenticator {
    pub fn new(bcrypt_cost: u32) -> Self {
        Self { bcrypt_cost }
    }

    /// Create an account with the given role
    pub fn register(
        &self,
        store: &DocumentStore,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::MissingUsername);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        if store.find_user_by_name(username).is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = hash(password, self.bcrypt_cost)?;
        let user = store.create_user(User {
            id: new_id(),
            username: username.to_string(),
            password_hash,
            role,
        })?;
        Ok(user)
    }

    /// Check a username/password pair
    pub fn authenticate(
        &self,
        store: &DocumentStore,
        username: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let user = store
            .find_user_by_name(username.trim())
            .ok_or(AuthError::InvalidCredentials)?;

        if verify(password, &user.password_hash).unwrap_or(false) {
            Ok(user)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Seed admin accounts from `name:password` pairs, skipping existing names
    pub fn seed_admins(&self, store: &DocumentStore, admins: &[(String, String)]) -> usize {
        let mut created = 0;
        for (username, password) in admins {
            match self.register(store, username, password, Role::Admin) {
                Ok(_) => created += 1,
                Err(AuthError::UsernameTaken) => {}
                Err(e) => tracing::warn!(username = %username, error = %e, "failed to seed admin"),
            }
        }
        created
    }
}
