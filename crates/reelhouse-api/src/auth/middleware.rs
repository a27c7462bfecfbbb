use crate::auth::jwt::JwtService;
use crate::auth::models::OwnerContext;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use reelhouse_core::AppError;
use std::sync::Arc;

pub async fn auth_middleware(
    State(jwt): State<Arc<JwtService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return HttpAppError(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    };

    match jwt.validate_token(token.trim()) {
        Ok(owner_id) => {
            tracing::debug!(owner_id = %owner_id, "Request authenticated");
            request.extensions_mut().insert(OwnerContext { owner_id });
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}
