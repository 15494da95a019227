use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use super::dto::SessionUser;
use super::repo::Role;
use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "parish_session";

pub(crate) fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookie = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie.split(';') {
        let part = part.trim();
        if let Some(eq) = part.find('=') {
            let (name, value) = part.split_at(eq);
            if name == SESSION_COOKIE {
                return Some(value[1..].to_string());
            }
        }
    }
    None
}

/// Resolves the session cookie against the server-side store.
pub struct CurrentUser(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token =
            session_token(&parts.headers).ok_or(ApiError::Auth("not authenticated"))?;
        let user = state
            .sessions
            .validate(&token)
            .await
            .ok_or(ApiError::Auth("not authenticated"))?;
        Ok(CurrentUser(user))
    }
}

/// Staff capability: the same session lookup, but members are rejected
/// with 403 before the handler body runs.
pub struct StaffUser(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for StaffUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != Role::Staff {
            return Err(ApiError::Forbidden);
        }
        Ok(StaffUser(user))
    }
}
