//! Subject database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{Subject, User};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "subjects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub status: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user::Entity")]
    Users,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Build the domain entity with its related users.
    pub fn into_subject(self, users: Vec<super::user::Model>) -> Subject {
        Subject {
            id: self.id,
            name: self.name,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            users: users.into_iter().map(User::from).collect(),
        }
    }
}

/// Convert database model to domain entity, without the relation
impl From<Model> for Subject {
    fn from(model: Model) -> Self {
        model.into_subject(Vec::new())
    }
}
