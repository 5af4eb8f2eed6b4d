//! # User Repository
//!
//! Shop accounts. Implements the checkout `UserLookup` port.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use verdant_checkout::{CheckoutResult, UserLookup};
use verdant_core::validation::validate_required;
use verdant_core::{CoreError, User};

use crate::error::{DbError, DbResult};

const USER_COLUMNS: &str = "id, name, email, role, is_active, created_at, updated_at";

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user. Fails with `UniqueViolation` on a taken email.
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        validate_required("name", &user.name).map_err(CoreError::from)?;
        validate_required("email", &user.email).map_err(CoreError::from)?;

        debug!(id = %user.id, email = %user.email, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, role, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &user.email),
            other => other,
        })?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Activates or deactivates an account. Inactive users cannot order.
    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<()> {
        debug!(id = %id, is_active, "Updating user activation");

        let result = sqlx::query("UPDATE users SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(is_active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl UserLookup for UserRepository {
    async fn find_user(&self, user_id: &str) -> CheckoutResult<Option<User>> {
        self.get_by_id(user_id)
            .await
            .map_err(DbError::into_lookup_failure)
    }
}

/// Generates a new user ID.
pub fn generate_user_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use verdant_core::UserRole;

    fn user(email: &str) -> User {
        let now = Utc::now();
        User {
            id: generate_user_id(),
            name: "Beatriz".to_string(),
            email: email.to_string(),
            role: UserRole::Customer,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();
        let u = user("bia@verdant.test");

        repo.insert(&u).await.unwrap();
        let loaded = repo.get_by_id(&u.id).await.unwrap().unwrap();

        assert_eq!(loaded.email, "bia@verdant.test");
        assert_eq!(loaded.role, UserRole::Customer);
        assert!(loaded.is_active);
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        repo.insert(&user("same@verdant.test")).await.unwrap();
        let err = repo.insert(&user("same@verdant.test")).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::UniqueViolation { ref value, .. } if value == "same@verdant.test"
        ));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_active() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();
        let u = user("off@verdant.test");
        repo.insert(&u).await.unwrap();

        repo.set_active(&u.id, false).await.unwrap();
        let found = repo.find_user(&u.id).await.unwrap().unwrap();
        assert!(!found.is_active);

        assert!(matches!(
            repo.set_active("ghost", true).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
