use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use super::dto::{LoginRequest, RegisterRequest, RegisterResponse, SessionUser, UserResponse};
use super::extractors::{session_token, CurrentUser, SESSION_COOKIE};
use super::password::{hash_secret, verify_secret};
use super::repo::{NewUser, Role, User};
use crate::error::{is_unique_violation, ApiError};
use crate::state::AppState;

// Both unknown-email and wrong-secret land on this exact message.
const INVALID_CREDENTIALS: &str = "invalid credentials";

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn session_cookie(token: &str, max_age_secs: u64) -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age_secs}"
    ))
    .expect("hex token is a valid header value")
}

fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}=deleted; HttpOnly; SameSite=Lax; Path=/; Max-Age=0"
    ))
    .expect("static cookie is a valid header value")
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let secret = payload.secret.as_deref().filter(|s| !s.is_empty());
    let role_raw = payload
        .role
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let (Some(name), Some(email), Some(secret), Some(role_raw)) =
        (name, email, secret, role_raw)
    else {
        return Err(ApiError::validation(
            "name, email, secret and role are required",
        ));
    };

    let role = Role::parse(role_raw).ok_or(ApiError::Role)?;
    let email = email.to_lowercase();
    if !is_valid_email(&email) {
        warn!(email = %email, "register with invalid email");
        return Err(ApiError::validation("invalid email"));
    }

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict);
    }

    let credential = hash_secret(secret)?;
    let user = User::create(
        &state.db,
        NewUser {
            name,
            email: &email,
            credential: &credential,
            role,
            church: payload.church.as_deref().map(str::trim).filter(|s| !s.is_empty()),
        },
    )
    .await
    .map_err(|e| {
        // Two concurrent registers can pass the pre-check together.
        if is_unique_violation(&e) {
            ApiError::Conflict
        } else {
            e.into()
        }
    })?;

    info!(user_id = user.id, email = %user.email, role = role.as_str(), "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id: user.id }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<UserResponse>), ApiError> {
    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let secret = payload.secret.as_deref().filter(|s| !s.is_empty());
    let (Some(email), Some(secret)) = (email, secret) else {
        return Err(ApiError::validation("email and secret are required"));
    };
    let email = email.to_lowercase();

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or(ApiError::Auth(INVALID_CREDENTIALS))?;

    if !verify_secret(secret, &user.credential)? {
        warn!(user_id = user.id, "login with wrong secret");
        return Err(ApiError::Auth(INVALID_CREDENTIALS));
    }

    let session_user = SessionUser::from(&user);
    let token = state.sessions.issue(session_user.clone()).await;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        session_cookie(&token, state.sessions.ttl().as_secs()),
    );

    info!(user_id = user.id, "user logged in");
    Ok((headers, Json(UserResponse { user: session_user })))
}

#[instrument(skip_all)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse { user })
}

/// Idempotent: revoking an already-absent session still succeeds and the
/// cookie is cleared either way.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (HeaderMap, Json<Value>) {
    if let Some(token) = session_token(&headers) {
        state.sessions.revoke(&token).await;
    }
    let mut out = HeaderMap::new();
    out.insert(header::SET_COOKIE, clear_session_cookie());
    (out, Json(json!({ "message": "logged out" })))
}
