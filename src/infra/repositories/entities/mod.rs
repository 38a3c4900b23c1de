//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod subject;
pub mod user;

pub use user::{ActiveModel as UserActiveModel, Entity as UserEntity};
