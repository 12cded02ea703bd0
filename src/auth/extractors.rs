use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::AppError;

/// Request body accepted either as an HTML form post or as JSON, picked by
/// `Content-Type`.
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/json"))
            .unwrap_or(false);

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
                warn!(error = %e, "json body rejected");
                AppError::MalformedBody
            })?;
            Ok(Payload(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state).await.map_err(|e| {
                warn!(error = %e, "form body rejected");
                AppError::MalformedBody
            })?;
            Ok(Payload(value))
        }
    }
}
