use crate::middleware::auth::auth_middleware;
use crate::models::auth::*;
use crate::AppState;
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post, put, Router},
    response::Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::FromRow;
use std::sync::Arc;

pub fn auth_routes() -> Router {
    let public_routes = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/verify", get(verify_token));

    let protected_routes = Router::new()
        .route("/api/auth/profile", get(get_profile))
        .route("/api/auth/profile", put(update_profile))
        .route("/api/auth/account", delete(delete_account))
        .layer(axum::middleware::from_fn(auth_middleware));

    public_routes.merge(protected_routes)
}

async fn register(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, Json<ErrorResponse>)> {
    // Validate input
    if payload.email.is_empty() || payload.password.is_empty() || payload.first_name.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                success: false,
                message: "Email, password, and first name are required".to_string(),
            }),
        ));
    }

    if payload.password.len() < 6 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                success: false,
                message: "Password must be at least 6 characters long".to_string(),
            }),
        ));
    }

    // Check if user already exists
    let existing_user = sqlx::query("SELECT id FROM users WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&state.db_pool)
        .await;

    match existing_user {
        Ok(Some(_)) => {
            return Err((
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    success: false,
                    message: "User with this email already exists".to_string(),
                }),
            ));
        }
        Ok(None) => {} // User doesn't exist, proceed
        Err(e) => {
            tracing::error!("Database error checking existing user: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    message: "Internal server error".to_string(),
                }),
            ));
        }
    }

    // Hash the password
    let password_hash = match hash(&payload.password, DEFAULT_COST) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Error hashing password: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    message: "Internal server error".to_string(),
                }),
            ));
        }
    };

    // Insert new user with the default role
    let user_row = sqlx::query(
        "INSERT INTO users (email, password_hash, first_name, last_name, role, created_at, updated_at)
         VALUES ($1, $2, $3, $4, 'user', NOW(), NOW())
         RETURNING id, email, password_hash, first_name, last_name, role, created_at, updated_at"
    )
    .bind(&payload.email)
    .bind(&password_hash)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .fetch_one(&state.db_pool)
    .await;

    let user = match user_row {
        Ok(row) => {
            let mut user = User::from_row(&row).map_err(|e| {
                tracing::error!("Error converting row to User: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        success: false,
                        message: "Failed to create user".to_string(),
                    }),
                )
            })?;
            user.password_hash = String::new(); // Don't include password hash in response
            user
        }
        Err(e) => {
            tracing::error!("Error creating user: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    message: "Failed to create user".to_string(),
                }),
            ));
        }
    };

    // Generate JWT token
    let token = generate_jwt_token(&user)?;

    Ok(Json(AuthResponse {
        success: true,
        message: "User registered successfully".to_string(),
        user: UserResponse::from(user),
        token,
    }))
}

async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, Json<ErrorResponse>)> {
    // Validate input
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                success: false,
                message: "Email and password are required".to_string(),
            }),
        ));
    }

    // Find user by email
    let user_row = sqlx::query(
        "SELECT id, email, password_hash, first_name, last_name, role, created_at, updated_at
         FROM users WHERE email = $1"
    )
    .bind(&payload.email)
    .fetch_optional(&state.db_pool)
    .await;

    let user = match user_row {
        Ok(Some(row)) => User::from_row(&row).map_err(|e| {
            tracing::error!("Error converting row to User: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    message: "Internal server error".to_string(),
                }),
            )
        })?,
        Ok(None) => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    success: false,
                    message: "Invalid email or password".to_string(),
                }),
            ));
        }
        Err(e) => {
            tracing::error!("Database error finding user: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    message: "Internal server error".to_string(),
                }),
            ));
        }
    };

    // Verify password
    match verify(&payload.password, &user.password_hash) {
        Ok(true) => {} // Password is correct
        Ok(false) => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    success: false,
                    message: "Invalid email or password".to_string(),
                }),
            ));
        }
        Err(e) => {
            tracing::error!("Error verifying password: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    message: "Internal server error".to_string(),
                }),
            ));
        }
    }

    // Generate JWT token
    let token = generate_jwt_token(&user)?;

    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful".to_string(),
        user: UserResponse::from(user),
        token,
    }))
}

fn generate_jwt_token(user: &User) -> Result<String, (StatusCode, Json<ErrorResponse>)> {
    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "default_secret".to_string());

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .expect("valid timestamp")
        .timestamp();

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role.clone(),
        exp: expiration as usize,
        iat: Utc::now().timestamp() as usize,
    };

    match encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    ) {
        Ok(token) => Ok(token),
        Err(e) => {
            tracing::error!("Error generating JWT token: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    message: "Failed to generate authentication token".to_string(),
                }),
            ))
        }
    }
}

async fn verify_token(
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    // Extract the Authorization header
    let auth_header = match headers.get("Authorization") {
        Some(header) => header,
        None => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    success: false,
                    message: "Missing Authorization header".to_string(),
                }),
            ));
        }
    };

    let auth_str = match auth_header.to_str() {
        Ok(str) => str,
        Err(_) => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    success: false,
                    message: "Invalid Authorization header format".to_string(),
                }),
            ));
        }
    };

    let token = if auth_str.starts_with("Bearer ") {
        &auth_str[7..]
    } else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                success: false,
                message: "Invalid Authorization header format. Expected 'Bearer <token>'".to_string(),
            }),
        ));
    };

    let claims = match verify_jwt_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!("JWT verification failed: {}", e);
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    success: false,
                    message: "Invalid or expired token".to_string(),
                }),
            ));
        }
    };

    let user = fetch_user(&state, &claims).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "user": UserResponse::from(user)
    })))
}

async fn get_profile(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let user = fetch_user(&state, &claims).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "user": UserResponse::from(user)
    })))
}

async fn update_profile(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let user_id = claims.sub.parse::<i32>().unwrap_or(0);

    if payload.first_name.is_none() && payload.last_name.is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                success: false,
                message: "Nothing to update".to_string(),
            }),
        ));
    }

    if matches!(&payload.first_name, Some(name) if name.trim().is_empty()) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                success: false,
                message: "First name must not be empty".to_string(),
            }),
        ));
    }

    // Only the name fields are editable; email, role and created_at are not.
    let user_row = sqlx::query(
        "UPDATE users
         SET first_name = COALESCE($1, first_name),
             last_name = COALESCE($2, last_name),
             updated_at = NOW()
         WHERE id = $3
         RETURNING id, email, password_hash, first_name, last_name, role, created_at, updated_at"
    )
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(user_id)
    .fetch_optional(&state.db_pool)
    .await;

    let user = match user_row {
        Ok(Some(row)) => User::from_row(&row).map_err(|e| {
            tracing::error!("Error converting row to User: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    message: "Internal server error".to_string(),
                }),
            )
        })?,
        Ok(None) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    success: false,
                    message: "User not found".to_string(),
                }),
            ));
        }
        Err(e) => {
            tracing::error!("Database error updating profile: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    message: "Failed to update profile".to_string(),
                }),
            ));
        }
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "user": UserResponse::from(user)
    })))
}

async fn delete_account(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let user_id = claims.sub.parse::<i32>().unwrap_or(0);

    // Chat sessions and messages cascade with the user row.
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&state.db_pool)
        .await;

    match result {
        Ok(r) if r.rows_affected() > 0 => {
            tracing::info!("Deleted account for user {}", user_id);
            Ok(Json(serde_json::json!({
                "success": true,
                "message": "Account deleted"
            })))
        }
        Ok(_) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                success: false,
                message: "User not found".to_string(),
            }),
        )),
        Err(e) => {
            tracing::error!("Database error deleting account: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    message: "Failed to delete account".to_string(),
                }),
            ))
        }
    }
}

async fn fetch_user(
    state: &Arc<AppState>,
    claims: &Claims,
) -> Result<User, (StatusCode, Json<ErrorResponse>)> {
    let user_row = sqlx::query(
        "SELECT id, email, password_hash, first_name, last_name, role, created_at, updated_at
         FROM users WHERE id = $1"
    )
    .bind(claims.sub.parse::<i32>().unwrap_or(0))
    .fetch_optional(&state.db_pool)
    .await;

    match user_row {
        Ok(Some(row)) => {
            let mut user = User::from_row(&row).map_err(|e| {
                tracing::error!("Error converting row to User: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        success: false,
                        message: "Internal server error".to_string(),
                    }),
                )
            })?;
            user.password_hash = String::new(); // Don't include password hash
            Ok(user)
        }
        Ok(None) => Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                success: false,
                message: "User not found".to_string(),
            }),
        )),
        Err(e) => {
            tracing::error!("Database error finding user: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    message: "Internal server error".to_string(),
                }),
            ))
        }
    }
}

pub fn verify_jwt_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "default_secret".to_string());

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}
