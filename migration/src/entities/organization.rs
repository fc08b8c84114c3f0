//! Organization entity: the tenant root.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub slug: String,
    /// Billing tier ("free" | "pro")
    pub plan_tier: String,
    /// Default hostname for links without an explicit domain binding
    pub primary_domain: Option<String>,
    /// Lifecycle status ("active" | "suspended")
    pub status: String,
    /// Soft delete marker; null = alive
    pub deleted_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::link::Entity")]
    Link,
    #[sea_orm(has_many = "super::custom_domain::Entity")]
    CustomDomain,
}

impl Related<super::link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Link.def()
    }
}

impl Related<super::custom_domain::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomDomain.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
