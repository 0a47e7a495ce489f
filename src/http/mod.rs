use axum::Router;

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod routes;
mod validate;

pub use auth::AuthUser;
pub use error::{AppError, FieldError};
pub use validate::ValidatedJson;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health())
        .merge(routes::auth())
        .merge(routes::posts())
        .with_state(state)
}
