use crate::auth::CurrentUser;
use crate::auth::api::v1::ErrorResponse;
use crate::category::{Category, CategoryService, CategoryState};
use axum::{Extension, Router, extract::State, http::StatusCode, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// JSON representation of a Category for API responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryJson {
    id: i32,
    name: String,
    description: Option<String>,
}

impl From<Category> for CategoryJson {
    fn from(category: Category) -> Self {
        Self {
            id: category.id(),
            name: category.name().to_string(),
            description: category.description().map(str::to_string),
        }
    }
}

/// API response for listing categories.
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoriesResponse {
    categories: Vec<CategoryJson>,
    count: usize,
}

/// Handler for GET /api/v1/categories - Returns the caller's categories.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "Successfully retrieved categories", body = CategoriesResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Categories"
)]
pub async fn get_categories_handler(
    State(state): State<Arc<CategoryState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<CategoriesResponse>, (StatusCode, Json<ErrorResponse>)> {
    match CategoryService::new(&state.db)
        .list_categories(user.id)
        .await
    {
        Ok(categories) => {
            let categories: Vec<CategoryJson> =
                categories.into_iter().map(CategoryJson::from).collect();
            let count = categories.len();
            Ok(Json(CategoriesResponse { categories, count }))
        }
        Err(err) => {
            tracing::error!("Failed to get categories: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "INTERNAL_ERROR",
                    "Failed to retrieve categories",
                )),
            ))
        }
    }
}

/// Creates and returns the categories API router.
pub fn create_api_router(state: Arc<CategoryState>) -> Router {
    Router::new()
        .route("/categories", get(get_categories_handler))
        .with_state(state)
}
