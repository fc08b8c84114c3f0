//! Click event log table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClickEvent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClickEvent::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClickEvent::LinkId).string().not_null())
                    .col(
                        ColumnDef::new(ClickEvent::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ClickEvent::Referrer).text().null())
                    .col(ColumnDef::new(ClickEvent::Country).string().null())
                    .col(ColumnDef::new(ClickEvent::Region).string().null())
                    .col(ColumnDef::new(ClickEvent::City).string().null())
                    .col(ColumnDef::new(ClickEvent::UserAgent).text().null())
                    .col(ColumnDef::new(ClickEvent::DeviceType).string().null())
                    .col(ColumnDef::new(ClickEvent::Browser).string().null())
                    .col(ColumnDef::new(ClickEvent::Os).string().null())
                    .col(ColumnDef::new(ClickEvent::IpHash).string().null())
                    .col(ColumnDef::new(ClickEvent::UtmSource).string().null())
                    .col(ColumnDef::new(ClickEvent::UtmMedium).string().null())
                    .col(ColumnDef::new(ClickEvent::UtmCampaign).string().null())
                    .col(ColumnDef::new(ClickEvent::UtmTerm).string().null())
                    .col(ColumnDef::new(ClickEvent::UtmContent).string().null())
                    .to_owned(),
            )
            .await?;

        // 按链接 + 时间范围查询（unique visitor 判定、单链接分析）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_events_link_occurred")
                    .table(ClickEvent::Table)
                    .col(ClickEvent::LinkId)
                    .col(ClickEvent::OccurredAt)
                    .to_owned(),
            )
            .await?;

        // 按时间范围扫描（组织级快照）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_click_events_occurred_at")
                    .table(ClickEvent::Table)
                    .col(ClickEvent::OccurredAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClickEvent::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ClickEvent {
    #[sea_orm(iden = "click_events")]
    Table,
    Id,
    LinkId,
    OccurredAt,
    Referrer,
    Country,
    Region,
    City,
    UserAgent,
    DeviceType,
    Browser,
    Os,
    IpHash,
    UtmSource,
    UtmMedium,
    UtmCampaign,
    UtmTerm,
    UtmContent,
}
