use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::{context::Viewer, error::ApiError, error::Error, state::AppState};

/// 从 `Authorization: Bearer <token>` 中取出令牌
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

fn viewer_from_parts<S>(parts: &Parts, state: &AppState<S>) -> Viewer {
    match bearer_token(&parts.headers) {
        Some(token) if state.is_staff_token(token) => Viewer::staff(),
        _ => Viewer::anonymous(),
    }
}

/// 公开接口的访问者，令牌无效时按匿名访问处理
impl<S> FromRequestParts<AppState<S>> for Viewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        Ok(viewer_from_parts(parts, state))
    }
}

/// 后台接口的访问者，不是管理员时返回 401
#[derive(Debug, Clone, Copy)]
pub struct Staff;

impl<S> FromRequestParts<AppState<S>> for Staff
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        if viewer_from_parts(parts, state).is_staff {
            Ok(Staff)
        } else {
            tracing::debug!(path = %parts.uri.path(), "rejected admin request");
            Err(ApiError::Unauthorized.into())
        }
    }
}
