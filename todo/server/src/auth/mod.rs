use askama::Template;
use axum::Router;
use axum::extract::{Extension, Form, Request, State};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::encode;
use std::sync::Arc;

use crate::config::Config;
use crate::user::{User, UserService, UserServiceError};

pub mod api;
pub mod form;

use form::{DUPLICATE_USERNAME, INVALID_LOGIN, LoginRequest, RegisterForm, RegisterFormErrors};

pub const AUTH_COOKIE: &str = "auth_token";
const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Represents the currently authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
}

impl CurrentUser {
    /// Creates a new CurrentUser instance.
    pub fn new(id: i32, username: String) -> Self {
        Self { id, username }
    }
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        CurrentUser::new(user.id(), user.username().to_string())
    }
}

/// Authentication state: the JWT secret, cookie policy and the user store.
#[derive(Clone)]
pub struct AuthState {
    pub jwt_secret: String,
    pub secure_cookies: bool,
    pub db: Arc<sea_orm::DatabaseConnection>,
}

impl AuthState {
    /// Creates a new AuthState from the application config.
    pub fn from_config(config: &Config, db: Arc<sea_orm::DatabaseConnection>) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            secure_cookies: config.secure_cookies,
            db,
        }
    }
}

/// Creates the router for login, registration and logout.
pub fn create_auth_router(state: Arc<AuthState>) -> Router<()> {
    Router::new()
        .route(
            "/login",
            axum::routing::get(login_page_handler).post(login_handler),
        )
        .route(
            "/register",
            axum::routing::get(register_page_handler).post(register_handler),
        )
        .route("/logout", axum::routing::post(logout_handler))
        .with_state(state)
}

/// Authentication middleware that checks for a valid JWT cookie and sets the CurrentUser extension.
/// Tokens of users that no longer exist are ignored. This middleware never redirects.
pub async fn auth_user_middleware(
    State(state): State<Arc<AuthState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token_cookie) = jar.get(AUTH_COOKIE) {
        if let Some(current_user) = resolve_current_user(&state, token_cookie.value()).await {
            request.extensions_mut().insert(current_user);
        }
    }

    next.run(request).await
}

/// Login redirect middleware that redirects unauthenticated users to the login page.
/// This middleware should be applied after auth_user_middleware to check for CurrentUser extension.
pub async fn login_redirect_middleware(request: Request, next: Next) -> Response {
    let is_authenticated = request.extensions().get::<CurrentUser>().is_some();

    if !is_authenticated {
        return Redirect::to("/login").into_response();
    }

    next.run(request).await
}

/// Decodes a token and looks its user up.
pub(crate) async fn resolve_current_user(state: &AuthState, token: &str) -> Option<CurrentUser> {
    let claims = decode_jwt(token, &state.jwt_secret).await.ok()?;
    match UserService::new(&state.db).get_user_by_id(claims.user_id).await {
        Ok(user) => user.map(CurrentUser::from),
        Err(err) => {
            tracing::error!("Failed to load user {}: {}", claims.user_id, err);
            None
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct Claims {
    pub exp: usize,       // Expiry time of the token
    pub iat: usize,       // Issued at time of the token
    pub user_id: i32,     // ID of the authenticated user
    pub username: String, // Username of the authenticated user
}

/// Custom error type for authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Represents an error during template rendering.
    /// The specific `askama::Error` is captured as the source of this error.
    #[error("Template rendering failed")]
    Template(#[from] askama::Error),
    /// Represents an error during JWT operations.
    #[error("JWT operation failed")]
    JwtError,
    /// Looking up or storing a user failed.
    #[error("User store error")]
    UserService(#[from] UserServiceError),
}

impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("Authentication request failed: {:?}", self);
        let user_facing_error_message =
            "An unexpected error occurred while processing your request. Please try again later.";
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!(
                "<h1>Internal Server Error</h1><p>{}</p>",
                user_facing_error_message
            )),
        )
            .into_response()
    }
}

/// Handles GET requests to display the login page.
#[tracing::instrument]
pub async fn login_page_handler(
    current_user: Option<Extension<CurrentUser>>,
) -> Result<Response, AuthError> {
    if current_user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let template = LoginTemplate::default();
    Ok(Html(template.render()?).into_response())
}

/// Handles the login request.
/// Checks submitted username and password against the user store.
/// Users who are already logged in are sent to the task list.
pub async fn login_handler(
    State(state): State<Arc<AuthState>>,
    jar: CookieJar,
    current_user: Option<Extension<CurrentUser>>,
    Form(payload): Form<LoginRequest>,
) -> Result<(CookieJar, Response), AuthError> {
    if current_user.is_some() {
        return Ok((jar, Redirect::to("/").into_response()));
    }

    handle_login_attempt(state, jar, payload).await
}

/// Validates credentials and either logs the user in or re-renders the form with an error.
#[tracing::instrument(skip(state, jar, payload))]
async fn handle_login_attempt(
    state: Arc<AuthState>,
    jar: CookieJar,
    payload: LoginRequest,
) -> Result<(CookieJar, Response), AuthError> {
    let user_service = UserService::new(&state.db);
    match user_service
        .verify_credentials(&payload.username, &payload.password)
        .await?
    {
        Some(user) => {
            tracing::info!("User {} logged in", user.id());
            log_in(&state, jar, &user).await
        }
        None => {
            tracing::info!("Rejected login attempt");
            let template = LoginTemplate {
                username: payload.username,
                error: Some(INVALID_LOGIN.to_string()),
            };
            Ok((jar, Html(template.render()?).into_response()))
        }
    }
}

/// Handles GET requests to display the registration page.
#[tracing::instrument]
pub async fn register_page_handler(
    current_user: Option<Extension<CurrentUser>>,
) -> Result<Response, AuthError> {
    if current_user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let template = RegisterTemplate::default();
    Ok(Html(template.render()?).into_response())
}

/// Handles the registration form: creates the user and logs them in.
#[tracing::instrument(skip(state, jar, form))]
pub async fn register_handler(
    State(state): State<Arc<AuthState>>,
    jar: CookieJar,
    current_user: Option<Extension<CurrentUser>>,
    Form(form): Form<RegisterForm>,
) -> Result<(CookieJar, Response), AuthError> {
    if current_user.is_some() {
        return Ok((jar, Redirect::to("/").into_response()));
    }

    if let Err(errors) = form.validate() {
        return Ok((jar, render_register_errors(&form, errors)?));
    }

    let user_service = UserService::new(&state.db);
    match user_service
        .create_user(form.username.trim(), &form.password1)
        .await
    {
        Ok(user) => log_in(&state, jar, &user).await,
        Err(UserServiceError::DuplicateUsername(_)) => {
            let errors = RegisterFormErrors {
                username: Some(DUPLICATE_USERNAME.to_string()),
                ..Default::default()
            };
            Ok((jar, render_register_errors(&form, errors)?))
        }
        Err(err) => Err(AuthError::from(err)),
    }
}

/// Handles logout by expiring the auth cookie.
#[tracing::instrument(skip(jar))]
pub async fn logout_handler(jar: CookieJar) -> (CookieJar, Redirect) {
    let removal = Cookie::build((AUTH_COOKIE, "")).path("/").build();
    (jar.remove(removal), Redirect::to("/login"))
}

fn render_register_errors(
    form: &RegisterForm,
    errors: RegisterFormErrors,
) -> Result<Response, AuthError> {
    let template = RegisterTemplate {
        username: form.username.clone(),
        errors,
    };
    Ok(Html(template.render()?).into_response())
}

/// Issues the auth cookie for `user` and redirects to the task list.
async fn log_in(
    state: &AuthState,
    jar: CookieJar,
    user: &User,
) -> Result<(CookieJar, Response), AuthError> {
    let jwt_token = encode_jwt(user, &state.jwt_secret)
        .await
        .map_err(|_| AuthError::JwtError)?;

    let cookie = Cookie::build((AUTH_COOKIE, jwt_token))
        .http_only(true)
        .secure(state.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(TOKEN_LIFETIME_HOURS))
        .path("/")
        .build();

    Ok((jar.add(cookie), Redirect::to("/").into_response()))
}

pub async fn encode_jwt(user: &User, jwt_secret: &str) -> anyhow::Result<String> {
    let now = chrono::Utc::now();
    let expire = chrono::Duration::hours(TOKEN_LIFETIME_HOURS);
    let exp = (now + expire).timestamp() as usize;
    let iat = now.timestamp() as usize;
    let claims = Claims {
        exp,
        iat,
        user_id: user.id(),
        username: user.username().to_string(),
    };
    let jwt = encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;
    Ok(jwt)
}

pub async fn decode_jwt(token: &str, jwt_secret: &str) -> anyhow::Result<Claims> {
    let token_data = jsonwebtoken::decode(
        token,
        &jsonwebtoken::DecodingKey::from_secret(jwt_secret.as_bytes()),
        &jsonwebtoken::Validation::default(),
    )?;
    Ok(token_data.claims)
}

#[derive(Template, Default)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub username: String,
    pub error: Option<String>,
}

#[derive(Template, Default)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub username: String,
    pub errors: RegisterFormErrors,
}
