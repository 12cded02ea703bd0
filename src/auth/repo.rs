use std::sync::RwLock;

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::repo_types::{NewUser, User},
    error::AppError,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("mobile number already registered")]
    DuplicateMobileNumber,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateMobileNumber => AppError::MobileNumberTaken,
            StoreError::Backend(e) => AppError::Internal(e),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Oldest record with this mobile number, if any.
    async fn find_by_mobile(&self, mobile_number: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_mobile(&self, mobile_number: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, user_name, mobile_number, profile_pic, password_hash, created_at
            FROM users
            WHERE mobile_number = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(mobile_number)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| anyhow!(e).context("find user by mobile number"))?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, user_name, mobile_number, profile_pic, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| anyhow!(e).context("find user by id"))?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, user_name, mobile_number, profile_pic, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_name, mobile_number, profile_pic, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.user_name)
        .bind(&new_user.mobile_number)
        .bind(&new_user.profile_pic)
        .bind(&new_user.password_hash)
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::DuplicateMobileNumber)
            }
            Err(e) => Err(anyhow!(e).context("insert user").into()),
        }
    }
}

/// Process-local store used when no database is configured, and in tests.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or_default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend(anyhow!("user store lock poisoned"))
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_mobile(&self, mobile_number: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users
            .iter()
            .find(|u| u.mobile_number == mobile_number)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().map_err(poisoned)?;
        if users
            .iter()
            .any(|u| u.mobile_number == new_user.mobile_number)
        {
            return Err(StoreError::DuplicateMobileNumber);
        }
        let user = User {
            id: Uuid::new_v4(),
            user_name: new_user.user_name,
            mobile_number: new_user.mobile_number,
            profile_pic: new_user.profile_pic,
            password_hash: new_user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }
}
