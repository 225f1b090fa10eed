use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub nickname: String,
    pub profile_img: String,
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub username: String,
    pub nickname: String,
    pub profile_img: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            nickname: user.nickname.clone(),
            profile_img: user.profile_img.clone(),
        }
    }
}

pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub nickname: String,
    pub profile_img: String,
}
