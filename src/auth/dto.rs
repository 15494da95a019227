use serde::{Deserialize, Serialize};

use super::repo::{Role, User};

/// Request body for user registration. Everything is optional at the serde
/// layer so missing fields map to the validation taxonomy, not a decode
/// rejection.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub secret: Option<String>,
    pub role: Option<String>,
    pub church: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub secret: Option<String>,
}

/// Snapshot of a user carried in the server-side session and returned to
/// clients. Never includes the credential hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub church: Option<String>,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            church: user.church.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    #[serde(rename = "userId")]
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: SessionUser,
}
