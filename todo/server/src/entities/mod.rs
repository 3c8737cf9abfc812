//! `SeaORM` entities for the todo schema.

pub mod prelude;

pub mod category;
pub mod sea_orm_active_enums;
pub mod task;
pub mod user;
