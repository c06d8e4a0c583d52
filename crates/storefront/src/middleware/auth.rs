//! Authentication extractors and session lifecycle helpers.
//!
//! The authenticated state is a resolved user plus the bearer credential,
//! both held in the cookie session. [`RequireAuth`] is the gate between the
//! unauthenticated and authenticated views: it also performs session
//! restore, re-resolving the user from `/me` when the session carries only
//! a credential (e.g., after a storefront redeploy mid-session).

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use electro_core::AccessToken;

use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// A fully established authenticated session.
#[derive(Debug, Clone)]
pub struct Authenticated {
    /// The resolved user identity.
    pub user: CurrentUser,
    /// The bearer credential attached to backend calls.
    pub token: AccessToken,
}

/// Extractor that requires an authenticated session.
///
/// If the visitor is not logged in - no stored credential, or a credential
/// the backend no longer accepts - the request is redirected to the
/// sign-in view. A failed restore clears the stored credential so the next
/// request short-circuits without a network call.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(auth): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user.full_name)
/// }
/// ```
pub struct RequireAuth(pub Authenticated);

/// Rejection that sends the visitor to the sign-in view.
pub struct RedirectToLogin;

impl IntoResponse for RedirectToLogin {
    fn into_response(self) -> Response {
        Redirect::to("/auth/login").into_response()
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = RedirectToLogin;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(RedirectToLogin)?
            .clone();

        // No stored credential: unauthenticated, and no `/me` call is made.
        let token: AccessToken = session
            .get(session_keys::ACCESS_TOKEN)
            .await
            .ok()
            .flatten()
            .ok_or(RedirectToLogin)?;

        // Fast path: the user was already resolved for this session.
        if let Ok(Some(user)) = session.get::<CurrentUser>(session_keys::CURRENT_USER).await {
            return Ok(Self(Authenticated { user, token }));
        }

        // Restore: a credential without a resolved user. Ask the backend.
        match state.shop().me(&token).await {
            Ok(user) => {
                let user = CurrentUser::from(user);
                if let Err(e) = session.insert(session_keys::CURRENT_USER, &user).await {
                    tracing::error!("Failed to store restored user in session: {e}");
                    return Err(RedirectToLogin);
                }
                Ok(Self(Authenticated { user, token }))
            }
            Err(e) => {
                // Any restore failure downgrades silently to logged-out and
                // discards the credential; the visitor just sees the
                // sign-in view.
                tracing::debug!("Session restore failed, clearing credential: {e}");
                teardown_session(&session).await;
                Err(RedirectToLogin)
            }
        }
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request and never calls
/// the backend; it only reports an already-resolved user. Used by the auth
/// forms to bounce already-authenticated visitors to the catalog.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Persist a freshly authenticated user and credential in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn establish_session(
    session: &Session,
    user: &CurrentUser,
    token: &AccessToken,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::ACCESS_TOKEN, token).await?;
    session.insert(session_keys::CURRENT_USER, user).await?;
    Ok(())
}

/// Clear the credential and user from the session (logout / failed restore).
///
/// Always succeeds from the caller's perspective; session-store errors are
/// logged and swallowed because the outcome is "treat as logged out"
/// either way.
pub async fn teardown_session(session: &Session) {
    if let Err(e) = session.remove::<AccessToken>(session_keys::ACCESS_TOKEN).await {
        tracing::error!("Failed to remove access token from session: {e}");
    }
    if let Err(e) = session.remove::<CurrentUser>(session_keys::CURRENT_USER).await {
        tracing::error!("Failed to remove user from session: {e}");
    }
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {e}");
    }
}
