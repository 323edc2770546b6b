use axum::{
    extract::{DefaultBodyLimit, FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisteredResponse},
        extractors::AuthUser,
        repo::Accounts,
        services::JwtKeys,
    },
    error::AppResult,
    extract::ApiJson,
    images::{ensure_image, upload_image, Form},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

/// Multipart fields: `username`, `pass`, `forename`, `surname`, `email` and an
/// optional `avatar` image stored as `avatars/<user_id>.<ext>`.
#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    mut form: Form,
) -> AppResult<(StatusCode, Json<RegisteredResponse>)> {
    let avatar = form.take_file("avatar");
    if let Some(avatar) = &avatar {
        ensure_image(avatar, "avatar")?;
    }

    let username = form.text("username").to_string();
    let user_id = Accounts::new(state.db.clone())
        .register(
            &username,
            form.text("pass"),
            form.text("forename"),
            form.text("surname"),
            form.text("email"),
        )
        .await?;

    // the account exists at this point; a failed avatar write only costs the picture
    let avatar = match avatar {
        Some(image) => {
            match upload_image(
                state.storage.as_ref(),
                "avatars",
                &user_id.to_string(),
                "avatar",
                image,
            )
            .await
            {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!(error = %e, user_id, "avatar upload failed");
                    None
                }
            }
        }
        None => None,
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse {
            user_id,
            username,
            avatar,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let accounts = Accounts::new(state.db.clone());
    accounts.login(&payload.email, &payload.pass).await?;
    let user = accounts.get_user_data(&payload.email).await?;

    let token = JwtKeys::from_ref(&state).sign(&user)?;

    info!(user_id = user.user_id, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = Accounts::new(state.db.clone())
        .get_user_data_from_id(user.user_id)
        .await?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod me_tests {
    use super::*;

    #[test]
    fn public_user_never_serializes_the_hash() {
        let user = crate::auth::repo_types::User {
            user_id: 1,
            username: "doej".into(),
            password: "$argon2id$secret".into(),
            forename: "john".into(),
            surname: "doe".into(),
            email: "johndoe@email.com".into(),
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("johndoe@email.com"));
        assert!(!json.contains("argon2"));
    }
}
