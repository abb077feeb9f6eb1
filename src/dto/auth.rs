use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Fields are optional so a missing one is reported by the validators, not serde.
#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "cliente@urbangoal.mx")]
    pub email: Option<String>,
    pub password: Option<String>,
    #[schema(example = "Ana Pérez")]
    pub name: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    /// Unix timestamp (seconds) after which the token is refused.
    pub expires_at: i64,
}

/// JWT payload. `iss` and `aud` are checked on every request.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    /// `user` or `admin`.
    pub role: String,
    pub iss: String,
    pub aud: String,
    pub exp: usize,
}
