use axum::Router;
use axum::extract::MatchedPath;
use axum::http::{Request, StatusCode, header};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::{Html, IntoResponse, Response};
use migration::MigratorTrait;
use sea_orm::Database;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::Span;

use crate::auth::{AuthState, auth_user_middleware, create_auth_router, login_redirect_middleware};
use crate::category::{CategoryState, create_category_router};
use crate::config::{self, Config};
use crate::task::{TaskState, create_task_router};

pub mod api;
pub mod form;

/// Routes whose requests carry credentials; their query strings are never logged.
const SENSITIVE_ROUTES: [&str; 3] = ["/login", "/register", "/api/v1/login"];

const INTERNAL_ERROR_MESSAGE: &str =
    "An unexpected error occurred while processing your request. Please try again later.";

/// Custom error type for web handler operations.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// No route or record matches the request.
    #[error("Not found")]
    NotFound,
    /// Represents an error during template rendering.
    /// The specific `askama::Error` is captured as the source of this error.
    #[error("Template rendering failed")]
    Template(#[from] askama::Error),
}

impl axum::response::IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        match self {
            WebError::NotFound => not_found_response(),
            err => {
                tracing::error!("Request failed: {:?}", err);
                internal_error_response()
            }
        }
    }
}

/// The 404 page shared by all HTML handlers.
pub fn not_found_response() -> Response {
    (
        StatusCode::NOT_FOUND,
        Html("<h1>Not Found</h1><p>The requested page could not be found.</p>"),
    )
        .into_response()
}

/// The 500 page shared by all HTML handlers. Never includes error details.
pub fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(format!(
            "<h1>Internal Server Error</h1><p>{}</p>",
            INTERNAL_ERROR_MESSAGE
        )),
    )
        .into_response()
}

/// One `<option>` of a select box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    /// Creates an option, marking it selected when `value` equals `current`.
    pub fn new(value: impl Into<String>, label: impl Into<String>, current: &str) -> Self {
        let value = value.into();
        let selected = value == current;
        Self {
            value,
            label: label.into(),
            selected,
        }
    }
}

/// Builds request spans without recording headers, bodies or, for
/// credential routes, query strings.
#[derive(Clone, Debug, Default)]
pub struct FilteredMakeSpan;

impl<B> MakeSpan<B> for FilteredMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let method = request.method();
        let path = request.uri().path();
        let matched_path = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str);

        if SENSITIVE_ROUTES.contains(&path) {
            tracing::info_span!(
                "request",
                method = %method,
                path,
                matched_path,
                sensitive_route = true,
            )
        } else {
            tracing::info_span!(
                "request",
                method = %method,
                uri = %request.uri(),
                matched_path,
            )
        }
    }
}

/// Assembles the full application router over an open database connection.
pub fn create_app(config: &Config, db: sea_orm::DatabaseConnection) -> Router {
    let db = Arc::new(db);
    let auth_state = Arc::new(AuthState::from_config(config, db.clone()));
    let task_state = Arc::new(TaskState { db: db.clone() });
    let category_state = Arc::new(CategoryState { db });

    let protected_routes = Router::new()
        .merge(create_task_router(task_state.clone()))
        .merge(create_category_router(category_state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(auth_state.clone(), auth_user_middleware))
                .layer(from_fn(login_redirect_middleware)),
        );

    let public_routes = Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .merge(create_auth_router(auth_state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(auth_state.clone(), auth_user_middleware)),
        );

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .merge(api::create_api_router(auth_state, task_state, category_state))
        .fallback(not_found_handler)
        .layer(
            ServiceBuilder::new()
                .layer(SetSensitiveRequestHeadersLayer::new([
                    header::AUTHORIZATION,
                    header::COOKIE,
                ]))
                .layer(TraceLayer::new_for_http().make_span_with(FilteredMakeSpan)),
        )
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: config::Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let app = create_app(&config, db);
    axum::serve(listener, app).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

async fn not_found_handler() -> WebError {
    WebError::NotFound
}
