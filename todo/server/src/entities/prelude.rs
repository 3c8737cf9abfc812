pub use super::category::Entity as Category;
pub use super::task::Entity as Task;
pub use super::user::Entity as User;
