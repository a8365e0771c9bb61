//! Driving ports for account and administration use-cases.
//!
//! Inbound adapters call these to register, authenticate and manage users
//! without importing persistence or hashing infrastructure.

use async_trait::async_trait;

use crate::domain::{
    DisplayName, EmailMessage, Error, LoginCredentials, Registration, Role, User, UserId,
};

/// Profile fields a user may change; `None` leaves the value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<DisplayName>,
    pub image_url: Option<String>,
}

/// Domain use-case port for self-service accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Create a student account (or admin, for bootstrap emails).
    async fn register(&self, registration: Registration) -> Result<User, Error>;

    /// Validate credentials and return the authenticated user.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error>;

    /// Load the caller's profile.
    async fn profile(&self, user_id: &UserId) -> Result<User, Error>;

    /// Apply profile changes and return the updated user.
    async fn update_profile(&self, user_id: &UserId, update: ProfileUpdate)
    -> Result<User, Error>;
}

/// Domain use-case port for administrators.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminService: Send + Sync {
    /// List every user; requires the admin role.
    async fn list_users(&self, actor: &UserId) -> Result<Vec<User>, Error>;

    /// Change `target`'s role; admins cannot demote themselves.
    async fn set_role(&self, actor: &UserId, target: &UserId, role: Role) -> Result<User, Error>;

    /// Dispatch a transactional email.
    async fn send_email(&self, actor: &UserId, message: EmailMessage) -> Result<(), Error>;
}
