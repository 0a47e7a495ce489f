use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::engagement::{Comment, Like};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Author name at creation time; not refreshed when the user changes it.
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub text: String,
    #[serde(default)]
    pub likes: Vec<Like>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Store-managed revision, bumped on every successful rewrite.
    #[serde(skip)]
    pub version: i64,
}

impl Post {
    pub fn like_index(&self, user_id: Uuid) -> Option<usize> {
        self.likes.iter().position(|like| like.user_id == user_id)
    }

    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.like_index(user_id).is_some()
    }

    pub fn comment_index(&self, comment_id: Uuid) -> Option<usize> {
        self.comments.iter().position(|comment| comment.id == comment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(user_id: Uuid) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            user_id,
            name: "someone".into(),
            avatar: None,
            text: "hi".into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn comment_index_matches_comment_id_not_author() {
        let author = Uuid::new_v4();
        let comments = vec![comment(author), comment(Uuid::new_v4()), comment(author)];
        let target = comments[2].id;
        let post = Post {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "owner".into(),
            avatar: None,
            text: "hello".into(),
            likes: vec![],
            comments,
            created_at: OffsetDateTime::now_utc(),
            version: 0,
        };

        assert_eq!(post.comment_index(target), Some(2));
        assert_eq!(post.comment_index(Uuid::new_v4()), None);
    }

    #[test]
    fn version_is_not_serialized() {
        let post = Post {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "owner".into(),
            avatar: Some("avatar.png".into()),
            text: "hello".into(),
            likes: vec![Like { user_id: Uuid::new_v4() }],
            comments: vec![],
            created_at: OffsetDateTime::now_utc(),
            version: 7,
        };

        let value = serde_json::to_value(&post).unwrap();
        assert!(value.get("version").is_none());
        assert_eq!(value["likes"].as_array().unwrap().len(), 1);
    }
}
