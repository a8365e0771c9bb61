//! Account and administration services.
//!
//! Password hashing is CPU bound, so hashes are computed on the blocking
//! pool rather than on the async executor.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::domain::ports::{
    AccountService, AdminService, Mailer, PasswordHashError, PasswordHasher, ProfileUpdate,
    UserRepository,
};
use crate::domain::service_support::{find_user, map_user_error};
use crate::domain::{
    Email, EmailMessage, Error, LoginCredentials, Registration, Role, User, UserId,
};

fn map_hash_error(error: PasswordHashError) -> Error {
    Error::internal(format!("password hashing failed: {error}"))
}

async fn run_hasher<T, F>(hasher: Arc<dyn PasswordHasher>, op: F) -> Result<T, Error>
where
    T: Send + 'static,
    F: FnOnce(&dyn PasswordHasher) -> Result<T, PasswordHashError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(hasher.as_ref()))
        .await
        .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
        .map_err(map_hash_error)
}

/// Account service implementing [`AccountService`] and [`AdminService`].
pub struct UserAccountService<U> {
    users: Arc<U>,
    hasher: Arc<dyn PasswordHasher>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    admin_emails: HashSet<Email>,
}

impl<U> UserAccountService<U> {
    /// Create the service; registrations whose email appears in
    /// `admin_emails` receive the admin role.
    pub fn new(
        users: Arc<U>,
        hasher: Arc<dyn PasswordHasher>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        admin_emails: impl IntoIterator<Item = Email>,
    ) -> Self {
        Self {
            users,
            hasher,
            mailer,
            clock,
            admin_emails: admin_emails.into_iter().collect(),
        }
    }
}

impl<U> UserAccountService<U>
where
    U: UserRepository,
{
    async fn require_admin(&self, actor: &UserId) -> Result<User, Error> {
        let user = find_user(self.users.as_ref(), actor)
            .await
            .map_err(|_| Error::forbidden("admin role required"))?;
        if user.role() != Role::Admin {
            return Err(Error::forbidden("admin role required"));
        }
        Ok(user)
    }
}

#[async_trait]
impl<U> AccountService for UserAccountService<U>
where
    U: UserRepository,
{
    async fn register(&self, registration: Registration) -> Result<User, Error> {
        let role = if self.admin_emails.contains(registration.email()) {
            Role::Admin
        } else {
            Role::Student
        };
        let password = Zeroizing::new(registration.password().to_owned());
        let hash = run_hasher(Arc::clone(&self.hasher), move |hasher| {
            hasher.hash(password.as_str())
        })
        .await?;

        let user = User::new(
            UserId::random(),
            registration.email().clone(),
            registration.display_name().clone(),
            role,
            self.clock.utc(),
        );
        self.users
            .insert(&user, &hash)
            .await
            .map_err(map_user_error)?;
        info!(user_id = %user.id(), role = role.as_str(), "user registered");
        Ok(user)
    }

    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let stored = self
            .users
            .find_credentials(credentials.email())
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized("invalid credentials"))?;

        let password = Zeroizing::new(credentials.password().to_owned());
        let hash = stored.password_hash;
        let verified = run_hasher(Arc::clone(&self.hasher), move |hasher| {
            hasher.verify(password.as_str(), &hash)
        })
        .await?;
        if !verified {
            return Err(Error::unauthorized("invalid credentials"));
        }
        Ok(stored.user)
    }

    async fn profile(&self, user_id: &UserId) -> Result<User, Error> {
        find_user(self.users.as_ref(), user_id).await
    }

    async fn update_profile(
        &self,
        user_id: &UserId,
        update: ProfileUpdate,
    ) -> Result<User, Error> {
        let mut user = find_user(self.users.as_ref(), user_id).await?;
        if let Some(display_name) = update.display_name {
            user = user.with_display_name(display_name);
        }
        if let Some(image_url) = update.image_url {
            user = user.with_image_url(Some(image_url));
        }
        self.users
            .update_profile(&user)
            .await
            .map_err(map_user_error)?;
        Ok(user)
    }
}

#[async_trait]
impl<U> AdminService for UserAccountService<U>
where
    U: UserRepository,
{
    async fn list_users(&self, actor: &UserId) -> Result<Vec<User>, Error> {
        self.require_admin(actor).await?;
        self.users.list().await.map_err(map_user_error)
    }

    async fn set_role(&self, actor: &UserId, target: &UserId, role: Role) -> Result<User, Error> {
        self.require_admin(actor).await?;
        if actor == target && role != Role::Admin {
            return Err(Error::forbidden("admins cannot demote themselves"));
        }
        let updated = self
            .users
            .set_role(target, role)
            .await
            .map_err(map_user_error)?;
        if !updated {
            return Err(Error::not_found("user not found"));
        }
        info!(%actor, %target, role = role.as_str(), "user role changed");
        find_user(self.users.as_ref(), target).await
    }

    async fn send_email(&self, actor: &UserId, message: EmailMessage) -> Result<(), Error> {
        self.require_admin(actor).await?;
        self.mailer.send(&message).await.map_err(|err| {
            warn!(to = %message.to, error = %err, "transactional email failed");
            Error::service_unavailable("email delivery failed")
        })
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
