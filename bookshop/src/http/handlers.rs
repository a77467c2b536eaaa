use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::HeaderName;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{middleware, Extension, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::credentials::{hash_in_background, verify_in_background, Credentials};
use crate::users::{NewUser, UserSummary};

use super::auth::{authorise, session_cookie, CurrentUser};
use super::error::ApiError;
use super::responses::{
    BooksResponse, HealthResponse, MessageResponse, SignupResponse,
};
use super::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Routes registered before the `authorise` layer pass through the session
/// gate; routes registered after it are public.
pub fn router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    Router::new()
        .route("/users/me", get(current_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), authorise))
        .route("/health", get(health))
        .route("/books", get(list_books))
        .route("/signup", post(signup))
        .route("/login", post(login))
        // The last layer added runs first: the id is set before it is propagated.
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

fn read_credentials(
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Credentials, ApiError> {
    let Json(credentials) = payload.map_err(|rejection| {
        debug!(error = %rejection, "rejected request body");
        ApiError::BadInput(rejection.body_text())
    })?;
    credentials
        .normalized()
        .ok_or_else(|| ApiError::BadInput(String::from("nickname and password are required")))
}

async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let credentials = read_credentials(payload)?;

    let password_hash = hash_in_background(credentials.password).await.map_err(|err| {
        warn!(nickname = %credentials.nickname, error = %err, "password hashing failed");
        ApiError::Hashing(err.to_string())
    })?;

    let user = state
        .users
        .create(NewUser {
            nickname: credentials.nickname,
            password_hash,
        })
        .await
        .map_err(|err| {
            warn!(error = %err, "failed to create user");
            ApiError::Persistence(err.to_string())
        })?;

    info!(user_id = user.id, nickname = %user.nickname, "user created");
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            summary: "User successfully created",
            details: UserSummary::from(&user),
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    let credentials = read_credentials(payload)?;

    let stored = match state.users.find_by_nickname(&credentials.nickname).await {
        Ok(found) => found,
        Err(err) => {
            error!(error = %err, "user lookup failed during login");
            None
        }
    };

    // Unknown nickname and wrong password must be indistinguishable, in body and in cost.
    let stored_hash = stored.as_ref().map(|user| user.password.clone());
    let verified = verify_in_background(stored_hash, credentials.password).await;
    let user = match (stored, verified) {
        (Some(user), Ok(())) => user,
        (_, result) => {
            if let Err(err) = result {
                debug!(error = %err, "password verification failed");
            }
            warn!(nickname = %credentials.nickname, "login rejected");
            return Err(ApiError::InvalidCredentials);
        }
    };

    let token = state.tokens.issue(&user.nickname).map_err(|err| {
        error!(error = %err, "unable to sign session token");
        ApiError::TokenSigning
    })?;

    info!(nickname = %user.nickname, "user logged in");
    Ok((
        jar.add(session_cookie(token)),
        Json(MessageResponse::summary("Yaaay! You are logged in :)")),
    ))
}

async fn current_user(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserSummary> {
    Json(UserSummary::from(&user))
}

async fn list_books(State(state): State<AppState>) -> Result<Json<BooksResponse>, ApiError> {
    let books = state.books.list().await.map_err(|err| {
        error!(error = %err, "failed to list books");
        ApiError::Internal
    })?;
    debug!(books = books.len(), "books requested");
    Ok(Json(BooksResponse::new(books)))
}
