use axum::{
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::AppState;

/// Admin routes require `Authorization: Bearer <ADMIN_API_KEY>`.
pub async fn admin_auth<B>(
    State(state): State<AppState>,
    req: Request<B>,
    next: Next<B>,
) -> Result<Response, AppError> {
    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| !state.admin_api_key.is_empty() && token == &*state.admin_api_key);

    match presented {
        Some(true) => Ok(next.run(req).await),
        Some(false) => {
            tracing::warn!(uri = %req.uri(), "Rejected admin request with an invalid API key");
            Err(AppError::Unauthorized("invalid admin API key".to_string()))
        }
        None => Err(AppError::Unauthorized("missing bearer token".to_string())),
    }
}
