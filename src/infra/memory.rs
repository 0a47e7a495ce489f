use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::post::Post;
use crate::domain::user::User;

/// In-process document store with the same contract as the Postgres one.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Documents>>,
}

#[derive(Default)]
struct Documents {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credentials are never checked in-process, so only the profile is kept.
    pub async fn insert_user(&self, user: &User) -> Result<()> {
        let mut docs = self.inner.write().await;
        if docs.users.values().any(|stored| stored.email == user.email) {
            return Err(anyhow!("duplicate email: {}", user.email));
        }
        docs.users.insert(user.id, user.clone());
        Ok(())
    }

    pub async fn find_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let docs = self.inner.read().await;
        Ok(docs.users.get(&user_id).cloned())
    }

    pub async fn insert_post(&self, post: &Post) -> Result<()> {
        let mut docs = self.inner.write().await;
        if docs.posts.contains_key(&post.id) {
            return Err(anyhow!("duplicate post id: {}", post.id));
        }
        docs.posts.insert(post.id, post.clone());
        Ok(())
    }

    pub async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let docs = self.inner.read().await;
        Ok(docs.posts.get(&post_id).cloned())
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        let docs = self.inner.read().await;
        let mut posts: Vec<Post> = docs.posts.values().cloned().collect();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(posts)
    }

    pub async fn replace_post(&self, post: &Post, expected_version: i64) -> Result<bool> {
        let mut docs = self.inner.write().await;
        let Some(stored) = docs.posts.get_mut(&post.id) else {
            return Ok(false);
        };
        if stored.version != expected_version {
            return Ok(false);
        }

        stored.text = post.text.clone();
        stored.likes = post.likes.clone();
        stored.comments = post.comments.clone();
        stored.version = expected_version + 1;
        Ok(true)
    }

    pub async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        let mut docs = self.inner.write().await;
        Ok(docs.posts.remove(&post_id).is_some())
    }
}
