#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use todo_server::auth::{AUTH_COOKIE, encode_jwt};
use todo_server::config::Config;
use todo_server::user::{User, UserService};

pub const JWT_SECRET: &str = "test_secret";
pub const PASSWORD: &str = "correct horse battery";

pub fn test_config() -> Config {
    Config {
        db_url: "sqlite::memory:".to_string(),
        port: 8080,
        jwt_secret: JWT_SECRET.to_string(),
        secure_cookies: false,
    }
}

/// Opens a fresh in-memory database with all migrations applied.
///
/// The pool holds exactly one connection; every new SQLite memory connection
/// would otherwise see its own empty database.
pub async fn setup_db() -> anyhow::Result<DatabaseConnection> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .try_init();
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn create_user(db: &DatabaseConnection, username: &str) -> anyhow::Result<User> {
    let user = UserService::new(db).create_user(username, PASSWORD).await?;
    Ok(user)
}

/// The `Cookie` header value of a logged-in `user`.
pub async fn auth_cookie(user: &User) -> anyhow::Result<String> {
    let token = encode_jwt(user, JWT_SECRET).await?;
    Ok(format!("{}={}", AUTH_COOKIE, token))
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get("location")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}
