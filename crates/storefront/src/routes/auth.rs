//! Authentication route handlers: login, registration, logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::warn;

use nexus_core::Email;

use crate::api::{Credentials, NewAccount};
use crate::authz::landing;
use crate::filters;
use crate::session::AuthSession;
use crate::state::AppState;

use super::{Nav, flash_error, flash_success};

// =============================================================================
// Form and query types
// =============================================================================

/// Login form data. `next` carries the location remembered by the gate.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub next: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub nav: Nav,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Accept a remembered location only if it is a site-local path; anything
/// else would be an open redirect.
fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|path| path.starts_with('/') && !path.starts_with("//"))
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the login page.
pub async fn login_page(
    State(state): State<AppState>,
    auth: AuthSession,
    Query(query): Query<LoginQuery>,
) -> impl IntoResponse {
    let auth = auth.state().await;
    LoginTemplate {
        nav: Nav::build(&state, &auth).await,
        next: query.next.unwrap_or_default(),
        error: query.error,
        success: query.success,
    }
}

/// Handle login form submission.
///
/// The gateway validates the credentials; on success the session store
/// persists the pair wholesale and the cart store re-derives. The shopper
/// returns to the remembered location if the gate recorded one, otherwise
/// to the role's landing route.
pub async fn login(
    State(state): State<AppState>,
    auth: AuthSession,
    Form(form): Form<LoginForm>,
) -> Response {
    let credentials = Credentials {
        email: form.email,
        password: form.password,
    };

    let payload = match state.api().login(&credentials).await {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Login failed: {e}");
            let back = match safe_next(form.next.as_deref()) {
                Some(next) => format!("/login?next={}", urlencoding::encode(next)),
                None => "/login".to_owned(),
            };
            return flash_error(&back, &e.to_string()).into_response();
        }
    };

    if let Err(e) = auth.login(&payload.token, &payload.user).await {
        warn!("Failed to persist session: {e}");
        return flash_error("/login", "Could not start a session, please try again")
            .into_response();
    }

    // Dependents observing the session re-derive
    state.carts().sync(&auth.state().await).await;

    let target = safe_next(form.next.as_deref())
        .map_or_else(|| landing(payload.user.role), |next| next);
    Redirect::to(target).into_response()
}

/// Display the registration page.
pub async fn register_page(
    State(state): State<AppState>,
    auth: AuthSession,
    Query(query): Query<super::MessageQuery>,
) -> impl IntoResponse {
    let auth = auth.state().await;
    RegisterTemplate {
        nav: Nav::build(&state, &auth).await,
        error: query.error,
        success: query.success,
    }
}

/// Handle registration form submission. Creates a shopper account and
/// sends the new user to the login page.
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    if form.name.trim().is_empty() {
        return flash_error("/register", "Please enter your name").into_response();
    }

    if Email::parse(form.email.trim()).is_err() {
        return flash_error("/register", "Please enter a valid email address").into_response();
    }

    if form.password != form.password_confirm {
        return flash_error("/register", "Passwords do not match").into_response();
    }

    if form.password.len() < 8 {
        return flash_error("/register", "Password must be at least 8 characters")
            .into_response();
    }

    let account = NewAccount {
        name: form.name.trim().to_owned(),
        email: form.email.trim().to_owned(),
        password: form.password,
    };

    match state.api().register(&account).await {
        Ok(()) => {
            flash_success("/login", "Account created, please sign in").into_response()
        }
        Err(e) => {
            warn!("Registration failed: {e}");
            flash_error("/register", &e.to_string()).into_response()
        }
    }
}

/// Handle logout: clear the cart entry, clear the credential pair, go home.
/// Idempotent - logging out an anonymous session is a no-op.
pub async fn logout(State(state): State<AppState>, auth: AuthSession) -> Response {
    if let Some(user) = auth.state().await.user() {
        state.carts().clear(&user.id).await;
    }

    if let Err(e) = auth.logout().await {
        warn!("Failed to clear session on logout: {e}");
    }

    Redirect::to("/").into_response()
}
