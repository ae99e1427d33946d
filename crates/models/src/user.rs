use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Identity returned by the login endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct LoginResponse {
    pub jwt: String,
    pub user: User,
}
