use serde::Deserialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::app::auth::AuthSession;
use crate::domain::engagement::{Comment, Like};
use crate::domain::post::Post;
use crate::domain::user::User;
use crate::infra::store::Store;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TextInput {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub text: String,
}

/// Empty and whitespace-only text are both treated as missing.
fn not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("Text is required".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum PostError {
    #[error("validation failed")]
    Validation(#[from] ValidationErrors),
    #[error("post not found")]
    PostNotFound,
    #[error("comment does not exist")]
    CommentNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("user not authorized")]
    NotOwner,
    #[error("post already liked")]
    AlreadyLiked,
    #[error("post has not yet been liked")]
    NotLiked,
    #[error("post was modified concurrently, try again")]
    Contention,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct PostService {
    store: Store,
    max_retries: u32,
}

impl PostService {
    pub fn new(store: Store, max_retries: u32) -> Self {
        Self { store, max_retries }
    }

    pub async fn create_post(
        &self,
        session: &AuthSession,
        input: TextInput,
    ) -> Result<Post, PostError> {
        input.validate()?;
        let author = self.load_user(session.user_id()).await?;

        let post = Post {
            id: Uuid::new_v4(),
            user_id: author.id,
            name: author.name,
            avatar: author.avatar,
            text: input.text,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
            version: 0,
        };
        self.store.insert_post(&post).await?;

        Ok(post)
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>, PostError> {
        Ok(self.store.list_posts().await?)
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<Post, PostError> {
        self.store
            .find_post(post_id)
            .await?
            .ok_or(PostError::PostNotFound)
    }

    pub async fn delete_post(&self, session: &AuthSession, post_id: Uuid) -> Result<(), PostError> {
        let post = self.get_post(post_id).await?;
        if post.user_id != session.user_id() {
            return Err(PostError::NotOwner);
        }

        if !self.store.delete_post(post_id).await? {
            return Err(PostError::PostNotFound);
        }
        Ok(())
    }

    pub async fn like_post(
        &self,
        session: &AuthSession,
        post_id: Uuid,
    ) -> Result<Vec<Like>, PostError> {
        let user_id = session.user_id();
        self.mutate(post_id, |post| {
            if post.is_liked_by(user_id) {
                return Err(PostError::AlreadyLiked);
            }
            post.likes.insert(0, Like { user_id });
            Ok(post.likes.clone())
        })
        .await
    }

    pub async fn unlike_post(
        &self,
        session: &AuthSession,
        post_id: Uuid,
    ) -> Result<Vec<Like>, PostError> {
        let user_id = session.user_id();
        self.mutate(post_id, |post| {
            let index = post.like_index(user_id).ok_or(PostError::NotLiked)?;
            post.likes.remove(index);
            Ok(post.likes.clone())
        })
        .await
    }

    pub async fn add_comment(
        &self,
        session: &AuthSession,
        post_id: Uuid,
        input: TextInput,
    ) -> Result<Vec<Comment>, PostError> {
        input.validate()?;
        let author = self.load_user(session.user_id()).await?;

        self.mutate(post_id, |post| {
            let comment = Comment {
                id: Uuid::new_v4(),
                user_id: author.id,
                name: author.name.clone(),
                avatar: author.avatar.clone(),
                text: input.text.clone(),
                created_at: OffsetDateTime::now_utc(),
            };
            post.comments.insert(0, comment);
            Ok(post.comments.clone())
        })
        .await
    }

    pub async fn delete_comment(
        &self,
        session: &AuthSession,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Vec<Comment>, PostError> {
        let user_id = session.user_id();
        self.mutate(post_id, |post| {
            let index = post
                .comment_index(comment_id)
                .ok_or(PostError::CommentNotFound)?;
            if post.comments[index].user_id != user_id {
                return Err(PostError::NotOwner);
            }
            post.comments.remove(index);
            Ok(post.comments.clone())
        })
        .await
    }

    async fn load_user(&self, user_id: Uuid) -> Result<User, PostError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(PostError::UserNotFound)
    }

    /// Read-modify-write of one post under an optimistic version check.
    ///
    /// `apply` runs against a fresh copy on every attempt, so its
    /// preconditions are re-checked after a lost race.
    async fn mutate<T, F>(&self, post_id: Uuid, mut apply: F) -> Result<T, PostError>
    where
        F: FnMut(&mut Post) -> Result<T, PostError>,
    {
        for attempt in 0..=self.max_retries {
            let mut post = self.get_post(post_id).await?;
            let expected_version = post.version;
            let output = apply(&mut post)?;

            if self.store.replace_post(&post, expected_version).await? {
                return Ok(output);
            }
            tracing::debug!(post_id = %post_id, attempt, "post version moved, retrying");
        }

        tracing::warn!(post_id = %post_id, retries = self.max_retries, "gave up on contended post");
        Err(PostError::Contention)
    }
}
