//! Tenancy tables: organizations, custom_domains, links.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Organization::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Organization::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Organization::Slug).string().not_null())
                    .col(ColumnDef::new(Organization::PlanTier).string().not_null())
                    .col(ColumnDef::new(Organization::PrimaryDomain).string().null())
                    .col(ColumnDef::new(Organization::Status).string().not_null())
                    .col(
                        ColumnDef::new(Organization::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Organization::CreatedAt)
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
                    .name("idx_organizations_slug")
                    .table(Organization::Table)
                    .col(Organization::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_organizations_primary_domain")
                    .table(Organization::Table)
                    .col(Organization::PrimaryDomain)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CustomDomain::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomDomain::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CustomDomain::OrganizationId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CustomDomain::Hostname).string().not_null())
                    .col(ColumnDef::new(CustomDomain::Status).string().not_null())
                    .col(
                        ColumnDef::new(CustomDomain::VerificationToken)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CustomDomain::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 主机名全局唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_custom_domains_hostname")
                    .table(CustomDomain::Table)
                    .col(CustomDomain::Hostname)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_custom_domains_organization")
                    .table(CustomDomain::Table)
                    .col(CustomDomain::OrganizationId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Link::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Link::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Link::OrganizationId).string().not_null())
                    .col(ColumnDef::new(Link::DomainId).string().null())
                    .col(ColumnDef::new(Link::Slug).string().not_null())
                    .col(ColumnDef::new(Link::DestinationUrl).text().not_null())
                    .col(ColumnDef::new(Link::Status).string().not_null())
                    .col(
                        ColumnDef::new(Link::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Link::ClickCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Link::UniqueVisitors)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Link::LastClickedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Link::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // slug 唯一性按 (organization, domain) 作用域；domain_id 为 NULL 时
        // 各数据库视 NULL 互不相等，解析层按 created_at 兜底去重
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_links_org_domain_slug")
                    .table(Link::Table)
                    .col(Link::OrganizationId)
                    .col(Link::DomainId)
                    .col(Link::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_links_slug")
                    .table(Link::Table)
                    .col(Link::Slug)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_links_organization")
                    .table(Link::Table)
                    .col(Link::OrganizationId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_links_expires_at")
                    .table(Link::Table)
                    .col(Link::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Link::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CustomDomain::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Organization::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Organization {
    #[sea_orm(iden = "organizations")]
    Table,
    Id,
    Slug,
    PlanTier,
    PrimaryDomain,
    Status,
    DeletedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CustomDomain {
    #[sea_orm(iden = "custom_domains")]
    Table,
    Id,
    OrganizationId,
    Hostname,
    Status,
    VerificationToken,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Link {
    #[sea_orm(iden = "links")]
    Table,
    Id,
    OrganizationId,
    DomainId,
    Slug,
    DestinationUrl,
    Status,
    ExpiresAt,
    ClickCount,
    UniqueVisitors,
    LastClickedAt,
    CreatedAt,
}
