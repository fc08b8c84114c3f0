use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub organization_id: String,
    /// Null = path-based link resolved without a custom domain
    pub domain_id: Option<String>,
    /// Unique within (organization_id, domain_id), matched case-insensitively
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub destination_url: String,
    /// "active" | "expired" | "archived"
    pub status: String,
    pub expires_at: Option<DateTimeUtc>,
    /// Denormalized counters; authoritative analytics come from click_events
    pub click_count: i64,
    pub unique_visitors: i64,
    pub last_clicked_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id"
    )]
    Organization,
    #[sea_orm(
        belongs_to = "super::custom_domain::Entity",
        from = "Column::DomainId",
        to = "super::custom_domain::Column::Id"
    )]
    CustomDomain,
    #[sea_orm(has_many = "super::click_event::Entity")]
    ClickEvent,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::custom_domain::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomDomain.def()
    }
}

impl Related<super::click_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClickEvent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
