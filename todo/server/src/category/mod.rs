use crate::entities::*;
use sea_orm::*;

pub mod api;
pub mod form;
pub mod web;

pub use web::{CategoryState, create_category_router};

#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub struct Category {
    id: i32,
    name: String,
    description: Option<String>,
    user_id: i32,
}

impl Category {
    pub fn new(id: i32, name: String, description: Option<String>, user_id: i32) -> Self {
        Self {
            id,
            name,
            description,
            user_id,
        }
    }

    /// Returns the ID of the category.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the category name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the ID of the owning user.
    pub fn user_id(&self) -> i32 {
        self.user_id
    }
}

impl From<category::Model> for Category {
    fn from(model: category::Model) -> Self {
        Category::new(model.id, model.name, model.description, model.user_id)
    }
}

/// Validated fields of a category create/update form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
}

/// Error type for CategoryService operations.
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    /// The category does not exist or belongs to another user.
    #[error("Category with ID {0} not found")]
    CategoryNotFound(i32),
}

pub struct CategoryService<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

impl CategoryService<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> CategoryService<'_> {
        CategoryService { db }
    }

    /// Creates a category owned by `user_id`.
    #[tracing::instrument(skip(self))]
    pub async fn create_category(
        &self,
        user_id: i32,
        input: CategoryInput,
    ) -> Result<Category, CategoryServiceError> {
        let active_model = category::ActiveModel {
            name: ActiveValue::Set(input.name),
            description: ActiveValue::Set(input.description),
            user_id: ActiveValue::Set(user_id),
            ..Default::default()
        };
        let created_model = active_model.insert(self.db).await?;
        Ok(Category::from(created_model))
    }

    /// Retrieves a category by ID, provided it belongs to `user_id`.
    #[tracing::instrument(skip(self))]
    pub async fn get_category_for_user(
        &self,
        user_id: i32,
        id: i32,
    ) -> Result<Category, CategoryServiceError> {
        let model = self.find_owned(user_id, id).await?;
        Ok(Category::from(model))
    }

    /// Retrieves all categories of a user, ordered by ID.
    #[tracing::instrument(skip(self))]
    pub async fn list_categories(
        &self,
        user_id: i32,
    ) -> Result<Vec<Category>, CategoryServiceError> {
        let categories = category::Entity::find()
            .filter(category::Column::UserId.eq(user_id))
            .order_by_asc(category::Column::Id)
            .all(self.db)
            .await?
            .into_iter()
            .map(Category::from)
            .collect();
        Ok(categories)
    }

    /// Updates name and description of a category owned by `user_id`.
    #[tracing::instrument(skip(self))]
    pub async fn update_category(
        &self,
        user_id: i32,
        id: i32,
        input: CategoryInput,
    ) -> Result<Category, CategoryServiceError> {
        let category_to_update = self.find_owned(user_id, id).await?;

        let mut active_model: category::ActiveModel = category_to_update.into();
        active_model.name = ActiveValue::Set(input.name);
        active_model.description = ActiveValue::Set(input.description);
        let updated_model = active_model.update(self.db).await?;

        Ok(Category::from(updated_model))
    }

    /// Deletes a category owned by `user_id` along with every task filed under it.
    #[tracing::instrument(skip(self))]
    pub async fn delete_category(
        &self,
        user_id: i32,
        id: i32,
    ) -> Result<Category, CategoryServiceError> {
        let txn = self.db.begin().await?;

        let category_to_delete = category::Entity::find_by_id(id)
            .filter(category::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .ok_or(CategoryServiceError::CategoryNotFound(id))?;

        let deleted_tasks = task::Entity::delete_many()
            .filter(task::Column::CategoryId.eq(id))
            .exec(&txn)
            .await?;
        category::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        tracing::info!(
            "Deleted category {} with {} tasks",
            id,
            deleted_tasks.rows_affected
        );
        Ok(Category::from(category_to_delete))
    }

    async fn find_owned(
        &self,
        user_id: i32,
        id: i32,
    ) -> Result<category::Model, CategoryServiceError> {
        category::Entity::find_by_id(id)
            .filter(category::Column::UserId.eq(user_id))
            .one(self.db)
            .await?
            .ok_or(CategoryServiceError::CategoryNotFound(id))
    }
}
