//! Route authorization gate.
//!
//! Each protected route declares the set of roles allowed to render it; the
//! gate decides per navigation attempt whether the current session may
//! proceed. Anonymous sessions are sent to the login page with the original
//! path preserved for the post-login return; authenticated sessions with
//! the wrong role are sent to their own landing route.
//!
//! The historical client shipped with the role check commented out, so any
//! authenticated account could render any route. That behavior is a latent
//! bug, not a feature - real enforcement is the default here, and the old
//! behavior survives only behind the explicit `NEXUS_LEGACY_OPEN_ROUTES`
//! flag.

use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use tower_sessions::Session;

use nexus_core::Role;

use crate::session::{AuthSession, SessionState};
use crate::state::AppState;

/// The roles allowed to render a route.
#[derive(Debug, Clone, Copy)]
pub struct RoutePolicy {
    pub allowed: &'static [Role],
}

/// Cart routes: shoppers only.
pub const SHOPPER_ROUTES: RoutePolicy = RoutePolicy {
    allowed: &[Role::User],
};

/// Admin console: admins only.
pub const ADMIN_ROUTES: RoutePolicy = RoutePolicy {
    allowed: &[Role::Admin],
};

/// Super-admin console: super-admins only.
pub const SUPER_ADMIN_ROUTES: RoutePolicy = RoutePolicy {
    allowed: &[Role::SuperAdmin],
};

/// Outcome of evaluating a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// No session; redirect to login, remembering the requested location.
    Unauthenticated,
    /// The session may render the target.
    Authorized,
    /// Authenticated but not in the allow-list; redirect to the role's own
    /// landing route.
    Denied {
        /// The session's actual role.
        role: Role,
    },
}

/// Evaluate a route policy against the session state.
///
/// With `legacy_open_routes` set, any authenticated session is authorized
/// regardless of the allow-list (the original client's disabled check).
#[must_use]
pub fn evaluate(
    policy: RoutePolicy,
    auth: &SessionState,
    legacy_open_routes: bool,
) -> GateDecision {
    match auth {
        SessionState::Anonymous => GateDecision::Unauthenticated,
        SessionState::Authenticated { user, .. } => {
            if legacy_open_routes || policy.allowed.contains(&user.role) {
                GateDecision::Authorized
            } else {
                GateDecision::Denied { role: user.role }
            }
        }
    }
}

/// The landing route for a role, used both for denied navigation and for
/// the post-login redirect when no return location was remembered.
#[must_use]
pub const fn landing(role: Role) -> &'static str {
    match role {
        Role::SuperAdmin => "/superadmin",
        Role::Admin => "/admin",
        Role::User => "/",
    }
}

/// Rejection produced by the gate extractors.
pub enum GateRejection {
    /// Redirect to the login page, remembering the requested location.
    Login {
        /// The originally requested path.
        next: String,
    },
    /// Redirect to a role-appropriate landing route.
    Landing(&'static str),
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Login { next } => {
                let target = format!("/login?next={}", urlencoding::encode(&next));
                Redirect::to(&target).into_response()
            }
            Self::Landing(path) => Redirect::to(path).into_response(),
        }
    }
}

/// Extractor that requires an authenticated shopper.
///
/// The wrapped state is guaranteed to be `Authenticated`.
///
/// # Example
///
/// ```rust,ignore
/// async fn cart_page(RequireShopper(auth): RequireShopper) -> impl IntoResponse {
///     // auth.token() and auth.user() are both present
/// }
/// ```
pub struct RequireShopper(pub SessionState);

/// Extractor that requires an admin session.
pub struct RequireAdmin(pub SessionState);

/// Extractor that requires a super-admin session.
pub struct RequireSuperAdmin(pub SessionState);

async fn gate(
    parts: &mut Parts,
    state: &AppState,
    policy: RoutePolicy,
) -> Result<SessionState, GateRejection> {
    // Get the session from extensions (set by SessionManagerLayer); a
    // missing layer is treated as an anonymous session.
    let auth = match parts.extensions.get::<Session>() {
        Some(session) => AuthSession::new(session.clone()).state().await,
        None => SessionState::Anonymous,
    };

    match evaluate(policy, &auth, state.config().legacy_open_routes) {
        GateDecision::Authorized => Ok(auth),
        GateDecision::Unauthenticated => Err(GateRejection::Login {
            next: original_path(parts),
        }),
        GateDecision::Denied { role } => Err(GateRejection::Landing(landing(role))),
    }
}

/// The request's path before any router nesting stripped it.
fn original_path(parts: &Parts) -> String {
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or_else(|| parts.uri.path().to_owned(), |uri| uri.path().to_owned())
}

impl FromRequestParts<AppState> for RequireShopper {
    type Rejection = GateRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        gate(parts, state, SHOPPER_ROUTES).await.map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = GateRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        gate(parts, state, ADMIN_ROUTES).await.map(Self)
    }
}

impl FromRequestParts<AppState> for RequireSuperAdmin {
    type Rejection = GateRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        gate(parts, state, SUPER_ADMIN_ROUTES).await.map(Self)
    }
}
