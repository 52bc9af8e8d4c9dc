use axum::{extract::State, Form, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::create_access_token;
use crate::errors::AppError;
use crate::models::user::{User, UserResponse};
use crate::state::AppState;

const DUPLICATE_USER: &str = "The user with this username already exists in the system.";

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// OAuth2 password-grant form; `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

/// POST /api/v1/auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let email = req.email.trim().to_lowercase();
    if !is_plausible_email(&email) {
        return Err(AppError::Validation("A valid email address is required".to_string()));
    }
    if req.password.is_empty() {
        return Err(AppError::Validation("Password cannot be empty".to_string()));
    }

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(&email)
        .fetch_one(&state.db)
        .await?;
    if exists {
        return Err(AppError::Validation(DUPLICATE_USER.to_string()));
    }

    let hashed = hash_password(&req.password)?;
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, full_name, hashed_password)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(req.full_name.as_deref().map(str::trim).filter(|n| !n.is_empty()))
    .bind(&hashed)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        // Lost a race with a concurrent signup for the same email.
        if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
            AppError::Validation(DUPLICATE_USER.to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    tracing::info!("Created user {}", user.id);
    Ok(Json(UserResponse::from(user)))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, AppError> {
    let email = form.username.trim().to_lowercase();
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;

    let user = match user {
        Some(user) if verify_password(&form.password, &user.hashed_password) => user,
        _ => return Err(AppError::Validation("Incorrect email or password".to_string())),
    };

    let access_token = create_access_token(
        user.id,
        &state.config.secret_key,
        state.config.access_token_expire_minutes,
    )?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}
