use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use vigil_core::AppError;

use super::jwt::{AuthOutcome, JwtService};
use crate::error::HttpAppError;

pub async fn auth_middleware(
    State(jwt): State<Arc<JwtService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match jwt.authenticate(authorization) {
        AuthOutcome::Authenticated(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        AuthOutcome::Unauthenticated(reason) => {
            tracing::debug!(reason = %reason, "Authentication failed");
            HttpAppError(AppError::Unauthorized(reason)).into_response()
        }
        AuthOutcome::Error(e) => HttpAppError(e).into_response(),
    }
}
