use axum::{routing::delete, routing::get, routing::post, routing::put, Router};

use crate::http::handlers;
use crate::AppState;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn auth() -> Router<AppState> {
    Router::new().route("/auth", get(handlers::get_current_user))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route("/post", post(handlers::create_post).get(handlers::list_posts))
        .route("/post/:id", get(handlers::get_post).delete(handlers::delete_post))
        .route("/post/like/:id", put(handlers::like_post))
        .route("/post/unlike/:id", put(handlers::unlike_post))
        .route("/post/comment/:id", post(handlers::comment_post))
        .route(
            "/post/comment/:id/:comment_id",
            delete(handlers::delete_comment),
        )
}
