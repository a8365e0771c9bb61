//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{StoredCredentials, UserPersistenceError, UserRepository};
use crate::domain::{DisplayName, Email, Role, User, UserId};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{NewUserRow, UserProfileUpdate, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the user repository port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    map_basic_pool_error(error, UserPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    map_basic_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

/// Convert a stored row into a validated domain user.
///
/// Rows that no longer satisfy domain validation surface as query errors
/// rather than being silently repaired.
fn row_to_user(row: UserRow) -> Result<(User, String), UserPersistenceError> {
    let UserRow {
        id,
        email,
        display_name,
        password_hash,
        role,
        billing_customer_id,
        image_url,
        created_at,
    } = row;
    let email = Email::new(&email).map_err(|err| UserPersistenceError::query(err.to_string()))?;
    let display_name = DisplayName::new(&display_name)
        .map_err(|err| UserPersistenceError::query(err.to_string()))?;
    let role: Role = role
        .parse()
        .map_err(|err: crate::domain::UserValidationError| {
            UserPersistenceError::query(err.to_string())
        })?;
    let user = User::new(UserId::from_uuid(id), email, display_name, role, created_at)
        .with_billing_customer(billing_customer_id)
        .with_image_url(image_url);
    Ok((user, password_hash))
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &User, password_hash: &str) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewUserRow {
            id: *user.id().as_uuid(),
            email: user.email().as_ref(),
            display_name: user.display_name().as_ref(),
            password_hash,
            role: user.role().as_str(),
            billing_customer_id: user.billing_customer_id(),
            image_url: user.image_url(),
            created_at: user.created_at(),
            updated_at: user.created_at(),
        };

        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                if is_unique_violation(&err) {
                    UserPersistenceError::duplicate_email(user.email().as_ref())
                } else {
                    map_diesel_error(err)
                }
            })
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| row_to_user(row).map(|(user, _)| user))
            .transpose()
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| {
            row_to_user(row).map(|(user, password_hash)| StoredCredentials {
                user,
                password_hash,
            })
        })
        .transpose()
    }

    async fn update_profile(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = UserProfileUpdate {
            display_name: user.display_name().as_ref(),
            image_url: user.image_url(),
        };

        diesel::update(users::table.filter(users::id.eq(user.id().as_uuid())))
            .set((&changes, users::updated_at.eq(diesel::dsl::now)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn set_role(&self, id: &UserId, role: Role) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set((
                users::role.eq(role.as_str()),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn set_billing_customer(
        &self,
        id: &UserId,
        customer_id: &str,
    ) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set((
                users::billing_customer_id.eq(customer_id),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .order((users::created_at.desc(), users::id.desc()))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|row| row_to_user(row).map(|(user, _)| user))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion coverage; query behaviour is exercised against
    //! PostgreSQL in the integration suite.
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use uuid::Uuid;

    fn row(role: &str, email: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            display_name: "Ada Lovelace".to_owned(),
            password_hash: "$argon2id$stub".to_owned(),
            role: role.to_owned(),
            billing_customer_id: Some("cus_123".to_owned()),
            image_url: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).single().expect("valid time"),
        }
    }

    #[rstest]
    fn valid_rows_become_users() {
        let (user, hash) = row_to_user(row("teacher", "ada@example.com")).expect("valid row");
        assert_eq!(user.role(), Role::Teacher);
        assert_eq!(user.billing_customer_id(), Some("cus_123"));
        assert_eq!(hash, "$argon2id$stub");
    }

    #[rstest]
    #[case("overlord", "ada@example.com")]
    #[case("student", "not-an-email")]
    fn corrupt_rows_are_query_errors(#[case] role: &str, #[case] email: &str) {
        let err = row_to_user(row(role, email)).expect_err("corrupt row");
        assert!(matches!(err, UserPersistenceError::Query { .. }));
    }
}
