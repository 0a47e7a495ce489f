use anyhow::Result;
use uuid::Uuid;

use crate::config::{AppConfig, StoreBackend};
use crate::domain::post::Post;
use crate::domain::user::User;
use crate::infra::db::Db;
use crate::infra::memory::MemoryStore;

/// Handle to the document store holding users and posts.
///
/// Built once at startup and cloned into request state; `close` releases
/// the underlying connections.
#[derive(Clone)]
pub enum Store {
    Postgres(Db),
    Memory(MemoryStore),
}

impl Store {
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        match config.store_backend {
            StoreBackend::Postgres => Ok(Self::Postgres(Db::connect(config).await?)),
            StoreBackend::Memory => Ok(Self::memory()),
        }
    }

    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub async fn ping(&self) -> Result<()> {
        match self {
            Self::Postgres(db) => db.ping().await,
            Self::Memory(_) => Ok(()),
        }
    }

    pub async fn close(&self) {
        if let Self::Postgres(db) = self {
            db.close().await;
        }
    }

    /// The hash is persisted only by the Postgres backend, where the schema requires it.
    pub async fn insert_user(&self, user: &User, password_hash: &str) -> Result<()> {
        match self {
            Self::Postgres(db) => db.insert_user(user, password_hash).await,
            Self::Memory(mem) => mem.insert_user(user).await,
        }
    }

    pub async fn find_user(&self, user_id: Uuid) -> Result<Option<User>> {
        match self {
            Self::Postgres(db) => db.find_user(user_id).await,
            Self::Memory(mem) => mem.find_user(user_id).await,
        }
    }

    pub async fn insert_post(&self, post: &Post) -> Result<()> {
        match self {
            Self::Postgres(db) => db.insert_post(post).await,
            Self::Memory(mem) => mem.insert_post(post).await,
        }
    }

    pub async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        match self {
            Self::Postgres(db) => db.find_post(post_id).await,
            Self::Memory(mem) => mem.find_post(post_id).await,
        }
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        match self {
            Self::Postgres(db) => db.list_posts().await,
            Self::Memory(mem) => mem.list_posts().await,
        }
    }

    pub async fn replace_post(&self, post: &Post, expected_version: i64) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.replace_post(post, expected_version).await,
            Self::Memory(mem) => mem.replace_post(post, expected_version).await,
        }
    }

    pub async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.delete_post(post_id).await,
            Self::Memory(mem) => mem.delete_post(post_id).await,
        }
    }
}
