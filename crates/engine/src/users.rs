//! Users table.
//!
//! Users are provisioned outside the engine (see `tally_admin`); the engine
//! only reads them and updates their weekly limit.

use sea_orm::entity::prelude::*;

/// A user as seen by the engine.
///
/// `password_hash` is an argon2 PHC string. It is deliberately not
/// serializable so it can never leak through an API response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    /// Weekly limit in minor units. `<= 0` means no limit is configured.
    pub weekly_spending_limit: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub weekly_spending_limit: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            password_hash: model.password_hash,
            weekly_spending_limit: model.weekly_spending_limit,
        }
    }
}
