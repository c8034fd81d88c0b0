//! HTTP Handlers for the demo API

use std::sync::Arc;

use authem::presentation::http_env::{EnvResponse, HttpEnvConfig, HttpRequestEnv};
use authem::{
    Authenticator, AuthemError, PgSessionRepository, RoleRegistry, SignInOptions, Subject,
    SubjectRef,
};
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shared state for the demo handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoleRegistry>,
    pub repo: Arc<PgSessionRepository>,
    pub env_config: Arc<HttpEnvConfig>,
}

/// Demo subject directory. The session core only ever sees (type, id);
/// looking subjects up and checking their credentials is the host's job.
struct DemoUser {
    id: i64,
    email: &'static str,
}

impl Subject for DemoUser {
    fn subject_type(&self) -> &str {
        "User"
    }

    fn subject_id(&self) -> i64 {
        self.id
    }
}

const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        id: 1,
        email: "joe@example.com",
    },
    DemoUser {
        id: 2,
        email: "jane@example.com",
    },
];

fn find_user(email: &str) -> Option<&'static DemoUser> {
    DEMO_USERS.iter().find(|user| user.email == email)
}

#[derive(Deserialize)]
pub struct SignInRequest {
    pub email: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Deserialize)]
pub struct SignOutEverywhereRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub role: String,
    pub subject: SubjectRef,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub signed_in: bool,
    pub subject: Option<SubjectRef>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-out", post(sign_out))
        .route("/auth/sign-out-everywhere", post(sign_out_everywhere))
        .route("/auth/me", get(me))
        .with_state(state)
}

type ApiAuthenticator = Authenticator<PgSessionRepository, HttpRequestEnv>;

fn authenticator(state: &AppState, headers: &HeaderMap, url: &str) -> ApiAuthenticator {
    let env = HttpRequestEnv::from_request((*state.env_config).clone(), headers, url);
    Authenticator::new(state.registry.clone(), state.repo.clone(), env)
}

/// Apply pending cookie writes and any requested redirect to a response
fn apply_env(response: Response, env_response: EnvResponse) -> Response {
    let mut response = match env_response.redirect {
        Some(target) => {
            let mut redirect = StatusCode::SEE_OTHER.into_response();
            if let Ok(location) = header::HeaderValue::from_str(&target) {
                redirect.headers_mut().insert(header::LOCATION, location);
            }
            redirect
        }
        None => response,
    };

    for cookie in env_response.set_cookies {
        if let Ok(value) = header::HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}

/// POST /auth/sign-in
async fn sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SignInRequest>,
) -> Response {
    let mut auth = authenticator(&state, &headers, "/auth/sign-in");

    let result = auth
        .sign_in(
            find_user(&req.email),
            SignInOptions {
                remember: req.remember,
                ..SignInOptions::default()
            },
        )
        .await;

    match result {
        Ok(session) => {
            let body = Json(SessionResponse {
                role: session.role.clone(),
                subject: session.subject.clone(),
                expires_at: session.expires_at,
            });
            apply_env(body.into_response(), auth.into_env().finish())
        }
        // Unknown email: an authentication failure, not a caller bug
        Err(AuthemError::MissingSubject) => StatusCode::UNAUTHORIZED.into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /auth/sign-out
async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut auth = authenticator(&state, &headers, "/auth/sign-out");

    match auth.sign_out_role("user").await {
        Ok(()) => apply_env(
            StatusCode::NO_CONTENT.into_response(),
            auth.into_env().finish(),
        ),
        Err(e) => e.into_response(),
    }
}

/// POST /auth/sign-out-everywhere
async fn sign_out_everywhere(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SignOutEverywhereRequest>,
) -> Response {
    let mut auth = authenticator(&state, &headers, "/auth/sign-out-everywhere");

    match auth.clear_for("user", find_user(&req.email)).await {
        Ok(deleted) => apply_env(
            Json(serde_json::json!({ "deleted": deleted })).into_response(),
            auth.into_env().finish(),
        ),
        Err(AuthemError::MissingSubject) => StatusCode::UNAUTHORIZED.into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /auth/me
async fn me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut auth = authenticator(&state, &headers, "/auth/me");

    match auth.current("user").await {
        Ok(subject) => {
            let body = Json(MeResponse {
                signed_in: subject.is_some(),
                subject,
            });
            apply_env(body.into_response(), auth.into_env().finish())
        }
        Err(e) => e.into_response(),
    }
}
