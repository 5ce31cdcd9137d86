use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
    extractors::AuthUser,
    services::AuthService,
};
use crate::{error::AppResult, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

#[instrument(skip(auth, payload))]
pub async fn register(
    State(auth): State<AuthService>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    auth.register(payload).await.map(Json)
}

#[instrument(skip(auth, payload))]
pub async fn login(
    State(auth): State<AuthService>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    auth.login(payload).await.map(Json)
}

#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(PublicUser::from(&user))
}
