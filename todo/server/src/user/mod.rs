use crate::entities::*;
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use sea_orm::*;

#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub struct User {
    id: i32,
    username: String,
}

impl User {
    pub fn new(id: i32, username: String) -> Self {
        Self { id, username }
    }

    /// Returns the ID of the user.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the username.
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl From<user::Model> for User {
    fn from(model: user::Model) -> Self {
        User::new(model.id, model.username)
    }
}

/// Error type for UserService operations.
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// The username is already taken.
    #[error("A user with username '{0}' already exists")]
    DuplicateUsername(String),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    /// Represents a user not found error.
    #[error("User with ID {0} not found")]
    UserNotFound(i32),
    /// Hashing or parsing a stored password hash failed.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

impl From<argon2::password_hash::Error> for UserServiceError {
    fn from(err: argon2::password_hash::Error) -> Self {
        UserServiceError::PasswordHash(err.to_string())
    }
}

pub struct UserService<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

impl UserService<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> UserService<'_> {
        UserService { db }
    }

    /// Registers a new user, storing an argon2 hash of the password.
    #[tracing::instrument(skip(self, password))]
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, UserServiceError> {
        if self.get_user_by_username(username).await?.is_some() {
            return Err(UserServiceError::DuplicateUsername(username.to_string()));
        }

        let created_model = self
            .insert_user(username, hash_password(password)?)
            .await?;
        tracing::info!("Registered user {}", created_model.id);
        Ok(User::from(created_model))
    }

    /// Inserts the user row. A username taken between the lookup and the
    /// insert surfaces as `DuplicateUsername`, not as a database error.
    async fn insert_user(
        &self,
        username: &str,
        password_hash: String,
    ) -> Result<user::Model, UserServiceError> {
        let active_model = user::ActiveModel {
            username: ActiveValue::Set(username.to_string()),
            password_hash: ActiveValue::Set(password_hash),
            date_joined: ActiveValue::Set(chrono::Utc::now().fixed_offset()),
            ..Default::default()
        };
        active_model
            .insert(self.db)
            .await
            .map_err(|err| match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    UserServiceError::DuplicateUsername(username.to_string())
                }
                _ => UserServiceError::Database(err),
            })
    }

    /// Checks a username/password pair.
    ///
    /// Returns `Ok(None)` when the user does not exist or the password does not match.
    #[tracing::instrument(skip(self, password))]
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, UserServiceError> {
        let Some(model) = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db)
            .await?
        else {
            return Ok(None);
        };

        let parsed_hash = PasswordHash::new(&model.password_hash)?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(Some(User::from(model))),
            Err(argon2::password_hash::Error::Password) => Ok(None),
            Err(err) => Err(UserServiceError::from(err)),
        }
    }

    /// Retrieves a user by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>, UserServiceError> {
        let model = user::Entity::find_by_id(id).one(self.db).await?;
        Ok(model.map(User::from))
    }

    /// Retrieves a user by username.
    #[tracing::instrument(skip(self))]
    pub async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, UserServiceError> {
        let model = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db)
            .await?;
        Ok(model.map(User::from))
    }

    /// Deletes a user together with all of their tasks and categories.
    ///
    /// Tasks go first since they reference both the user and the categories.
    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, id: i32) -> Result<User, UserServiceError> {
        let txn = self.db.begin().await?;

        let user_to_delete = user::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(UserServiceError::UserNotFound(id))?;

        let deleted_tasks = task::Entity::delete_many()
            .filter(task::Column::UserId.eq(id))
            .exec(&txn)
            .await?;
        let deleted_categories = category::Entity::delete_many()
            .filter(category::Column::UserId.eq(id))
            .exec(&txn)
            .await?;
        user::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        tracing::info!(
            "Deleted user {} with {} tasks and {} categories",
            id,
            deleted_tasks.rows_affected,
            deleted_categories.rows_affected
        );
        Ok(User::from(user_to_delete))
    }
}

fn hash_password(password: &str) -> Result<String, UserServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}
