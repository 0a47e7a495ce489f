use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::http::AppError;

/// JSON body that has been deserialized and passed its `Validate` rules.
///
/// Body and field failures both surface as 400 with the field-error list.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(body_rejection)?;

        payload
            .validate()
            .map_err(|errors| AppError::validation(&errors))?;

        Ok(ValidatedJson(payload))
    }
}

fn body_rejection(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            AppError::invalid_body("expected a JSON body with content-type application/json")
        }
        other => AppError::invalid_body(other.body_text()),
    }
}
