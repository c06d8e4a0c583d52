//! Authentication route handlers.
//!
//! Login and registration exchange credentials for a bearer token at the
//! backend, resolve the user via `/me`, and persist both in the cookie
//! session. Failures redirect back to the form with an `?error=` code so a
//! reload never resubmits credentials.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, establish_session, teardown_session};
use crate::models::CurrentUser;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

/// Map an `?error=` code to the message shown above the form.
fn error_message(code: &str) -> String {
    match code {
        "credentials" => "Invalid email or password".to_string(),
        "register" => "Could not create the account. The email may already be taken".to_string(),
        "session" => "Something went wrong, please try again".to_string(),
        other => other.to_string(),
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
///
/// Already-authenticated visitors are bounced to the catalog.
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        error: query.error.as_deref().map(error_message),
    }
    .into_response()
}

/// Handle login form submission.
///
/// Exchanges the credentials for a bearer token, then resolves the user via
/// `/me` so the session holds both.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let token = match state.shop().login(&form.email, &form.password).await {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            return Redirect::to("/auth/login?error=credentials").into_response();
        }
    };

    match state.shop().me(&token).await {
        Ok(user) => {
            let user = CurrentUser::from(user);
            if let Err(e) = establish_session(&session, &user, &token).await {
                tracing::error!("Failed to set session: {e}");
                return Redirect::to("/auth/login?error=session").into_response();
            }

            set_sentry_user(&user.id, Some(user.email.as_str()));
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::warn!("Failed to fetch user after login: {e}");
            Redirect::to("/auth/login?error=session").into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    RegisterTemplate {
        error: query.error.as_deref().map(error_message),
    }
    .into_response()
}

/// Handle registration form submission.
///
/// The backend does not return a token on registration, so a successful
/// registration is followed by a login with the same credentials.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    if let Err(e) = state
        .shop()
        .register(&form.email, &form.password, &form.full_name)
        .await
    {
        tracing::warn!("Registration failed: {e}");
        return Redirect::to("/auth/register?error=register").into_response();
    }

    // Registration succeeded; sign the new account in.
    login(
        State(state),
        session,
        Form(LoginForm {
            email: form.email,
            password: form.password,
        }),
    )
    .await
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// Drops the credential and user from the session. The bearer token is not
/// revoked server-side; the backend does not expose a revocation endpoint.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Redirect {
    teardown_session(&session).await;
    clear_sentry_user();

    Redirect::to("/auth/login")
}
