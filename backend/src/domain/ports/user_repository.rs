//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{Email, Role, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// The email address is already registered.
        DuplicateEmail { email: String } => "email already registered: {email}",
    }
}

/// User row together with the stored password hash, used for login only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user with its password hash.
    async fn insert(&self, user: &User, password_hash: &str) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user and password hash by login email.
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError>;

    /// Persist display name and image changes.
    async fn update_profile(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Change a user's role, returning `false` when the user does not exist.
    async fn set_role(&self, id: &UserId, role: Role) -> Result<bool, UserPersistenceError>;

    /// Store the payment provider's customer reference for a user.
    async fn set_billing_customer(
        &self,
        id: &UserId,
        customer_id: &str,
    ) -> Result<(), UserPersistenceError>;

    /// List every user, newest first.
    async fn list(&self) -> Result<Vec<User>, UserPersistenceError>;
}
