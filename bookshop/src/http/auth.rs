//! Session cookie issuing and the gate in front of protected routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::token::{TokenError, SESSION_LIFETIME_SECS};
use crate::users::{DirectoryError, User};

use super::error::ApiError;
use super::state::AppState;

pub const SESSION_COOKIE: &str = "Authorisation";

/// Identity the gate attaches to a request that passed it.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Why a request was refused. Logged, never sent to the client.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing Authorisation cookie")]
    MissingCredential,
    #[error("{0}")]
    InvalidToken(TokenError),
    #[error("expired session")]
    ExpiredSession,
    #[error("user not found")]
    UserNotFound,
    #[error("user lookup failed: {0}")]
    Directory(DirectoryError),
}

impl From<TokenError> for AuthError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Expired => AuthError::ExpiredSession,
            other => AuthError::InvalidToken(other),
        }
    }
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .max_age(cookie::time::Duration::seconds(SESSION_LIFETIME_SECS))
        .http_only(true)
        .secure(false)
        .same_site(SameSite::Lax)
        .build()
}

/// Resolves the user behind the session cookie.
///
/// The directory is read on every call, so deleting a user invalidates their
/// outstanding tokens immediately.
pub async fn validate_session(state: &AppState, jar: &CookieJar) -> Result<User, AuthError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(AuthError::MissingCredential)?;

    let claims = state.tokens.verify(&token)?;

    state
        .users
        .find_by_nickname(&claims.nickname)
        .await
        .map_err(AuthError::Directory)?
        .ok_or(AuthError::UserNotFound)
}

/// Middleware: forwards to the next stage with [`CurrentUser`] attached, or
/// answers 401 without running it.
pub async fn authorise(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match validate_session(&state, &jar).await {
        Ok(user) => {
            debug!(nickname = %user.nickname, "authorized request using session");
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Err(AuthError::Directory(err)) => {
            error!(error = %err, "session user lookup failed");
            ApiError::Unauthorized.into_response()
        }
        Err(reason) => {
            warn!(reason = %reason, "unauthorized request");
            ApiError::Unauthorized.into_response()
        }
    }
}
