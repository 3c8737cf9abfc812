use std::sync::Arc;

use crate::{
    auth::{self, AuthState},
    category::{self, CategoryState},
    task::{self, TaskState},
};

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
};
use tower::ServiceBuilder;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::api::v1::json_login_handler,
        task::api::v1::get_tasks_handler,
        category::api::v1::get_categories_handler,
    ),
    components(schemas(
        auth::api::v1::JsonLoginRequest,
        auth::api::v1::LoginResponse,
        auth::api::v1::ErrorResponse,
        task::api::v1::TaskJson,
        task::api::v1::TasksResponse,
        category::api::v1::CategoryJson,
        category::api::v1::CategoriesResponse,
    )),
    modifiers(&BearerSecurity),
    tags(
        (name = "Auth", description = "Token issuing"),
        (name = "Tasks", description = "Task listing"),
        (name = "Categories", description = "Category listing")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` JWT scheme referenced by the protected paths.
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Creates the API routes for JSON API endpoints, plus the Swagger UI.
pub fn create_api_router(
    auth_state: Arc<AuthState>,
    task_state: Arc<TaskState>,
    category_state: Arc<CategoryState>,
) -> Router {
    let login_router = auth::api::v1::create_api_router(auth_state.clone());
    let protected_routes = Router::new()
        .merge(task::api::v1::create_api_router(task_state))
        .merge(category::api::v1::create_api_router(category_state))
        .layer(ServiceBuilder::new().layer(from_fn(auth::api::v1::require_auth_middleware)));
    let api_routes = login_router.merge(protected_routes);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(ServiceBuilder::new().layer(from_fn_with_state(
            auth_state,
            auth::api::v1::auth_user_middleware,
        )))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
