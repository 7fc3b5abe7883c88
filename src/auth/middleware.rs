use crate::types::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};

pub async fn auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let expected = state.config.auth.bearer_token.as_deref().ok_or_else(|| {
        error!("BEARER_TOKEN is not configured; rejecting protected request");
        AppError::Configuration("BEARER_TOKEN is not configured on the server.".to_string())
    })?;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token);

    match token {
        Some(token) if token == expected => Ok(next.run(req).await),
        Some(_) => {
            warn!(path = %req.uri().path(), "Rejected request with invalid bearer token");
            Err(AppError::Auth("Invalid or missing token".to_string()))
        }
        None => {
            warn!(path = %req.uri().path(), "Rejected request without bearer token");
            Err(AppError::Auth("Invalid or missing token".to_string()))
        }
    }
}

/// Token from an `Authorization` value, accepting any casing of the scheme.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
