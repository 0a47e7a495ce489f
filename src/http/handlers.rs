use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::app::posts::{PostError, PostService, TextInput};
use crate::app::users::UserService;
use crate::domain::engagement::{Comment, Like};
use crate::domain::post::Post;
use crate::domain::user::User;
use crate::http::{AppError, AuthUser, ValidatedJson};
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub msg: &'static str,
}

fn post_service(state: &AppState) -> PostService {
    PostService::new(state.store.clone(), state.mutation_max_retries)
}

/// Ids that fail to parse cannot name a stored document.
fn parse_id(raw: &str, missing: &'static str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found(missing))
}

/// Maps service failures to responses; only unexpected ones are logged.
fn post_error(err: PostError, action: &'static str) -> AppError {
    match err {
        PostError::Validation(errors) => AppError::validation(&errors),
        PostError::PostNotFound => AppError::not_found("post not found"),
        PostError::CommentNotFound => AppError::not_found("comment does not exist"),
        PostError::UserNotFound => AppError::not_found("user not found"),
        PostError::NotOwner => AppError::unauthorized("user not authorized"),
        PostError::AlreadyLiked => AppError::bad_request("post already liked"),
        PostError::NotLiked => AppError::bad_request("post has not yet been liked"),
        PostError::Contention => {
            AppError::conflict("post was modified concurrently, try again")
        }
        PostError::Store(err) => {
            tracing::error!(error = ?err, "failed to {}", action);
            AppError::internal("server error")
        }
    }
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.store.ping().await.is_ok() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse { status })
}

pub async fn get_current_user(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<User>, AppError> {
    let user_id = auth.session.user_id();
    let service = UserService::new(state.store.clone());
    let user = service.get_user(user_id).await.map_err(|err| {
        tracing::error!(error = ?err, user_id = %user_id, "failed to fetch current user");
        AppError::internal("server error")
    })?;

    match user {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::not_found("user not found")),
    }
}

pub async fn create_post(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<TextInput>,
) -> Result<Json<Post>, AppError> {
    let post = post_service(&state)
        .create_post(&auth.session, payload)
        .await
        .map_err(|err| post_error(err, "create post"))?;

    tracing::info!(post_id = %post.id, user_id = %post.user_id, "post created");
    Ok(Json(post))
}

pub async fn list_posts(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Post>>, AppError> {
    let posts = post_service(&state)
        .list_posts()
        .await
        .map_err(|err| post_error(err, "list posts"))?;

    Ok(Json(posts))
}

pub async fn get_post(
    Path(id): Path<String>,
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Post>, AppError> {
    let post_id = parse_id(&id, "post not found")?;
    let post = post_service(&state)
        .get_post(post_id)
        .await
        .map_err(|err| post_error(err, "fetch post"))?;

    Ok(Json(post))
}

pub async fn delete_post(
    Path(id): Path<String>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    let post_id = parse_id(&id, "post not found")?;
    post_service(&state)
        .delete_post(&auth.session, post_id)
        .await
        .map_err(|err| post_error(err, "delete post"))?;

    tracing::info!(post_id = %post_id, "post removed");
    Ok(Json(MessageResponse { msg: "Post removed" }))
}

pub async fn like_post(
    Path(id): Path<String>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Like>>, AppError> {
    let post_id = parse_id(&id, "post not found")?;
    let likes = post_service(&state)
        .like_post(&auth.session, post_id)
        .await
        .map_err(|err| post_error(err, "like post"))?;

    Ok(Json(likes))
}

pub async fn unlike_post(
    Path(id): Path<String>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Like>>, AppError> {
    let post_id = parse_id(&id, "post not found")?;
    let likes = post_service(&state)
        .unlike_post(&auth.session, post_id)
        .await
        .map_err(|err| post_error(err, "unlike post"))?;

    Ok(Json(likes))
}

pub async fn comment_post(
    Path(id): Path<String>,
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<TextInput>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let post_id = parse_id(&id, "post not found")?;
    let comments = post_service(&state)
        .add_comment(&auth.session, post_id, payload)
        .await
        .map_err(|err| post_error(err, "comment"))?;

    Ok(Json(comments))
}

pub async fn delete_comment(
    Path((id, comment_id)): Path<(String, String)>,
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let post_id = parse_id(&id, "post not found")?;
    let comment_id = parse_id(&comment_id, "comment does not exist")?;
    let comments = post_service(&state)
        .delete_comment(&auth.session, post_id, comment_id)
        .await
        .map_err(|err| post_error(err, "delete comment"))?;

    Ok(Json(comments))
}
