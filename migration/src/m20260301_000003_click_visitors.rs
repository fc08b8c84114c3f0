//! First-seen visitor table.
//!
//! The unique (link_id, fingerprint) index backs the atomic
//! `INSERT ... ON CONFLICT DO NOTHING` that replaces the old
//! count-then-increment unique-visitor check.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClickVisitor::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClickVisitor::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClickVisitor::LinkId).string().not_null())
                    .col(
                        ColumnDef::new(ClickVisitor::Fingerprint)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClickVisitor::FirstSeenAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_visitors_link_fingerprint")
                    .table(ClickVisitor::Table)
                    .col(ClickVisitor::LinkId)
                    .col(ClickVisitor::Fingerprint)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClickVisitor::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ClickVisitor {
    #[sea_orm(iden = "click_visitors")]
    Table,
    Id,
    LinkId,
    Fingerprint,
    FirstSeenAt,
}
