use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::repo_types::{NewUser, User, UserProfile};

const PG_UNIQUE_VIOLATION: &str = "23505";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Credential store: persistence for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    /// Inserts a user. A concurrent insert of the same email reports
    /// `StoreError::DuplicateEmail`.
    async fn create(&self, new_user: NewUser) -> Result<UserProfile, StoreError>;

    async fn find_profile(&self, id: Uuid) -> anyhow::Result<Option<UserProfile>>;

    /// Writes the mutable profile columns back. `None` if the row is gone.
    async fn save_profile(&self, profile: &UserProfile) -> anyhow::Result<Option<UserProfile>>;

    async fn list_profiles(&self) -> anyhow::Result<Vec<UserProfile>>;
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
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, occupation, bio,
                   instagram, facebook, linkedin, github, photo_url, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<UserProfile, StoreError> {
        let res = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO users (first_name, last_name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, first_name, last_name, email, occupation, bio,
                      instagram, facebook, linkedin, github, photo_url, created_at, updated_at
            "#,
        )
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(profile) => Ok(profile),
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION) =>
            {
                Err(StoreError::DuplicateEmail)
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert user").into()),
        }
    }

    async fn find_profile(&self, id: Uuid) -> anyhow::Result<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, first_name, last_name, email, occupation, bio,
                   instagram, facebook, linkedin, github, photo_url, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find profile by id")?;
        Ok(profile)
    }

    async fn save_profile(&self, p: &UserProfile) -> anyhow::Result<Option<UserProfile>> {
        let saved = sqlx::query_as::<_, UserProfile>(
            r#"
            UPDATE users
               SET first_name = $2, last_name = $3, occupation = $4, bio = $5,
                   instagram = $6, facebook = $7, linkedin = $8, github = $9,
                   photo_url = $10, updated_at = now()
             WHERE id = $1
            RETURNING id, first_name, last_name, email, occupation, bio,
                      instagram, facebook, linkedin, github, photo_url, created_at, updated_at
            "#,
        )
        .bind(p.id)
        .bind(&p.first_name)
        .bind(&p.last_name)
        .bind(&p.occupation)
        .bind(&p.bio)
        .bind(&p.instagram)
        .bind(&p.facebook)
        .bind(&p.linkedin)
        .bind(&p.github)
        .bind(&p.photo_url)
        .fetch_optional(&self.db)
        .await
        .context("update profile")?;
        Ok(saved)
    }

    async fn list_profiles(&self) -> anyhow::Result<Vec<UserProfile>> {
        let rows = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, first_name, last_name, email, occupation, bio,
                   instagram, facebook, linkedin, github, photo_url, created_at, updated_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(rows)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::collections::HashMap;
    use std::sync::Arc;

    use time::OffsetDateTime;
    use tokio::sync::RwLock;

    use super::*;

    /// In-memory store with the same uniqueness rule as the `users_email_key` index.
    #[derive(Default, Clone)]
    pub struct MemoryUserStore {
        users: Arc<RwLock<HashMap<Uuid, User>>>,
    }

    impl MemoryUserStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn len(&self) -> usize {
            self.users.read().await.len()
        }

        pub async fn get(&self, id: Uuid) -> Option<User> {
            self.users.read().await.get(&id).cloned()
        }
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
            let users = self.users.read().await;
            Ok(users.values().find(|u| u.email == email).cloned())
        }

        async fn create(&self, new_user: NewUser) -> Result<UserProfile, StoreError> {
            let mut users = self.users.write().await;
            if users.values().any(|u| u.email == new_user.email) {
                return Err(StoreError::DuplicateEmail);
            }
            let now = OffsetDateTime::now_utc();
            let user = User {
                id: Uuid::new_v4(),
                first_name: new_user.first_name,
                last_name: new_user.last_name,
                email: new_user.email,
                password_hash: new_user.password_hash,
                occupation: None,
                bio: None,
                instagram: None,
                facebook: None,
                linkedin: None,
                github: None,
                photo_url: None,
                created_at: now,
                updated_at: now,
            };
            users.insert(user.id, user.clone());
            Ok(user.into())
        }

        async fn find_profile(&self, id: Uuid) -> anyhow::Result<Option<UserProfile>> {
            Ok(self.users.read().await.get(&id).cloned().map(Into::into))
        }

        async fn save_profile(&self, p: &UserProfile) -> anyhow::Result<Option<UserProfile>> {
            let mut users = self.users.write().await;
            let Some(u) = users.get_mut(&p.id) else {
                return Ok(None);
            };
            u.first_name = p.first_name.clone();
            u.last_name = p.last_name.clone();
            u.occupation = p.occupation.clone();
            u.bio = p.bio.clone();
            u.instagram = p.instagram.clone();
            u.facebook = p.facebook.clone();
            u.linkedin = p.linkedin.clone();
            u.github = p.github.clone();
            u.photo_url = p.photo_url.clone();
            u.updated_at = OffsetDateTime::now_utc();
            Ok(Some(u.clone().into()))
        }

        async fn list_profiles(&self) -> anyhow::Result<Vec<UserProfile>> {
            let users = self.users.read().await;
            let mut out: Vec<UserProfile> = users.values().cloned().map(Into::into).collect();
            out.sort_by_key(|p| p.created_at);
            Ok(out)
        }
    }

    /// Store whose every call fails, for upstream error paths.
    pub struct BrokenUserStore;

    #[async_trait]
    impl UserStore for BrokenUserStore {
        async fn find_by_email(&self, _email: &str) -> anyhow::Result<Option<User>> {
            anyhow::bail!("connection refused")
        }
        async fn create(&self, _new_user: NewUser) -> Result<UserProfile, StoreError> {
            Err(anyhow::anyhow!("connection refused").into())
        }
        async fn find_profile(&self, _id: Uuid) -> anyhow::Result<Option<UserProfile>> {
            anyhow::bail!("connection refused")
        }
        async fn save_profile(&self, _p: &UserProfile) -> anyhow::Result<Option<UserProfile>> {
            anyhow::bail!("connection refused")
        }
        async fn list_profiles(&self) -> anyhow::Result<Vec<UserProfile>> {
            anyhow::bail!("connection refused")
        }
    }
}
