/// Authentication endpoints
///
/// - `POST /api/auth/register`: create an account, returns 201 with a token
/// - `POST /api/auth/login`: exchange credentials for a token
///
/// Both respond with
///
/// ```json
/// { "user": { "id": "...", "name": "Ada", "email": "ada@example.com" }, "token": "eyJ..." }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use taskpro_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, User, UserSummary},
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Counted in characters, not bytes
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,

    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserSummary,
    pub token: String,
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(mut req) = payload?;
    req.name = req.name.trim().to_string();
    req.email = req.email.trim().to_string();

    req.validate()?;

    let password = req.password;
    let password_hash =
        tokio::task::spawn_blocking(move || password::hash_password(&password)).await??;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    let token = issue_token(&state, &user)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserSummary::from(&user),
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(req) = payload?;
    let email = req.email.trim();

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let Some(user) = User::find_by_email(&state.db, email).await? else {
        tracing::debug!("Login attempt for unknown email");
        return Err(invalid());
    };

    let password = req.password;
    let hash = user.password_hash.clone();
    let verified =
        tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
            .await??;
    if !verified {
        tracing::debug!(user_id = %user.id, "Login attempt with wrong password");
        return Err(invalid());
    }

    if let Err(e) = User::update_last_login(&state.db, user.id).await {
        tracing::warn!(user_id = %user.id, error = %e, "Failed to record last login");
    }

    let token = issue_token(&state, &user)?;
    Ok(Json(AuthResponse {
        user: UserSummary::from(&user),
        token,
    }))
}

fn issue_token(state: &AppState, user: &User) -> ApiResult<String> {
    let claims = jwt::Claims::new(user.id, state.config.token_ttl());
    Ok(jwt::create_token(&claims, state.jwt_secret())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::validation_details;
    use taskpro_shared::auth::password::MIN_PASSWORD_LEN;

    fn request(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn error_fields(req: &RegisterRequest) -> Vec<String> {
        match req.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => validation_details(&errors).into_iter().map(|d| d.field).collect(),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(request("Ada", "ada@example.com", "secret").validate().is_ok());
    }

    #[test]
    fn test_registration_errors_are_collected() {
        let fields = error_fields(&request("", "not-an-email", "12345"));
        assert_eq!(fields, vec!["email", "name", "password"]);
    }

    #[test]
    fn test_password_minimum_matches_hashing_rules() {
        let shortest = "x".repeat(MIN_PASSWORD_LEN);
        assert!(request("Ada", "ada@example.com", &shortest).validate().is_ok());

        let too_short = "x".repeat(MIN_PASSWORD_LEN - 1);
        assert_eq!(error_fields(&request("Ada", "ada@example.com", &too_short)), vec!["password"]);
    }

    #[test]
    fn test_password_length_counts_characters() {
        // Six characters, twelve bytes
        assert!(request("Ada", "ada@example.com", "пароль").validate().is_ok());
        assert!(request("Ada", "ada@example.com", "abcde").validate().is_err());
    }

    #[test]
    fn test_overlong_name_is_rejected() {
        let name = "a".repeat(256);
        assert_eq!(error_fields(&request(&name, "ada@example.com", "secret")), vec!["name"]);
        assert!(request(&"a".repeat(255), "ada@example.com", "secret").validate().is_ok());
    }
}
