use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    email_step::{LoginFormController, Navigation, SESSION_EMAIL_KEY},
    login::{ForgotPasswordView, LoginStep, PasswordStepView},
    session::SessionStorage,
    AppState,
};

pub const SESSION_COOKIE: &str = "sid";

const LOGIN_PATH: &str = "/login";

fn session_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// Browser-session cookie: no max-age, so it ends with the browser session.
fn with_session_cookie(jar: CookieJar, id: Uuid, secure: bool) -> CookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure);
    jar.add(cookie)
}

// ============== Health ==============

/// GET /health - Liveness
pub async fn health() -> &'static str {
    "ok"
}

/// GET /ready - Database reachable and initialized
pub async fn ready(State(state): State<Arc<AppState>>) -> StatusCode {
    let check = rusqlite::Connection::open(&state.db_path).and_then(|conn| {
        conn.query_row("SELECT COUNT(*) FROM monitors", [], |row| row.get::<_, i64>(0))
    });

    match check {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = ?e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

// ============== Login Handlers ==============

#[derive(Debug, Deserialize)]
pub struct EmailSubmission {
    #[serde(default)]
    pub email: String,
}

/// "Reset password" is a second submit button of the email form, so it carries
/// whatever is typed. Without the field the controller's current value is used.
#[derive(Debug, Deserialize)]
pub struct ResetSubmission {
    pub email: Option<String>,
}

/// GET /login - Mount and render the current login step
pub async fn login_page(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (sid, page) = state
        .sessions
        .with_session(session_id(&jar), |session| match session.flow.step() {
            LoginStep::Email => {
                session.remount();
                session.email_step.render(&session.flow).into_response()
            }
            LoginStep::Password => PasswordStepView::new(&session.flow).into_response(),
        })
        .await;

    (with_session_cookie(jar, sid, state.secure_cookies), page).into_response()
}

/// POST /login/email - Feed the typed address through the email step and submit it
pub async fn submit_email(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(submission): Form<EmailSubmission>,
) -> Response {
    let debug_mode = state.debug_mode;
    let (sid, outcome) = state
        .sessions
        .with_session(session_id(&jar), |session| {
            if session.flow.step() != LoginStep::Email {
                return Redirect::to(LOGIN_PATH).into_response();
            }

            session.email_step.input(&submission.email, &mut session.flow);
            let submitted = session.email_step.submit(&mut session.flow);

            if submitted && session.flow.step() == LoginStep::Password {
                if debug_mode {
                    tracing::info!(email = %session.flow.form().email, "Login advanced to password step");
                }
                Redirect::to(LOGIN_PATH).into_response()
            } else {
                if debug_mode {
                    tracing::info!(
                        error = ?session.flow.errors().email,
                        "Login email step rejected"
                    );
                }
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    session.email_step.render(&session.flow),
                )
                    .into_response()
            }
        })
        .await;

    (with_session_cookie(jar, sid, state.secure_cookies), outcome).into_response()
}

/// POST /login/back - Return from the password step to the email step
pub async fn go_back(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (sid, ()) = state
        .sessions
        .with_session(session_id(&jar), |session| session.flow.on_back())
        .await;

    (
        with_session_cookie(jar, sid, state.secure_cookies),
        Redirect::to(LOGIN_PATH),
    )
        .into_response()
}

/// POST /login/reset-password - The email step's "Reset password" action
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(submission): Form<ResetSubmission>,
) -> Response {
    let debug_mode = state.debug_mode;
    let (sid, navigation) = state
        .sessions
        .with_session(session_id(&jar), |session| {
            if let (Some(typed), LoginStep::Email) = (&submission.email, session.flow.step()) {
                session.email_step.input(typed, &mut session.flow);
            }
            let navigation = session
                .email_step
                .reset_password(&session.flow, &mut session.storage);
            if debug_mode {
                tracing::info!(
                    handed_off = session.storage.get_item(SESSION_EMAIL_KEY).is_some(),
                    "Login email step sent to password recovery"
                );
            }
            navigation
        })
        .await;

    let Navigation::To(path) = navigation;
    (
        with_session_cookie(jar, sid, state.secure_cookies),
        Redirect::to(path),
    )
        .into_response()
}

/// GET /forgot-password - Recovery page, pre-filled from the session handoff
pub async fn forgot_password(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (sid, email) = state
        .sessions
        .with_session(session_id(&jar), |session| {
            session
                .storage
                .get_item(SESSION_EMAIL_KEY)
                .map(str::to_string)
                .unwrap_or_default()
        })
        .await;

    (
        with_session_cookie(jar, sid, state.secure_cookies),
        ForgotPasswordView { email },
    )
        .into_response()
}
