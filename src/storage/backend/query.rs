//! Query operations for SeaOrmStorage
//!
//! Read-only lookups used by the resolver and the quota ledger, plus the
//! expiry sweep. All hostname/slug matching happens through SQL `LOWER()`
//! so stored casing never affects resolution.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, IntoColumnRef, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, ExprTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use tracing::info;

use super::converters::{model_to_link, model_to_organization, model_to_resolved_link};
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, ShortspaceError};
use crate::storage::models::{Link, LinkStatus, Organization, ResolvedLink};

use migration::entities::{custom_domain, link, organization};

/// LOWER(column) = value
fn lower_eq(col: impl IntoColumnRef, value: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(col))).eq(Expr::val(value))
}

impl SeaOrmStorage {
    /// 仅 ACTIVE 且未过期的链接参与解析
    fn live_link_condition(now: DateTime<Utc>) -> Condition {
        Condition::all()
            .add(link::Column::Status.eq(LinkStatus::Active.as_str()))
            .add(
                Condition::any()
                    .add(link::Column::ExpiresAt.is_null())
                    .add(link::Column::ExpiresAt.gt(now)),
            )
    }

    /// 软删除的组织不参与解析；挂起（suspended）不排除
    fn org_alive_condition() -> Condition {
        Condition::all().add(organization::Column::DeletedAt.is_null())
    }

    /// Step 1/2a: link bound to a custom domain whose hostname matches.
    ///
    /// `hostname` and `slug` must already be lowercased by the caller.
    pub async fn find_link_by_custom_domain(
        &self,
        hostname: &str,
        slug: &str,
    ) -> Result<Option<ResolvedLink>> {
        let now = Utc::now();
        let db = &self.db;
        let hostname = hostname.to_string();
        let slug = slug.to_string();

        let model = retry::with_retry(
            "find_link_by_custom_domain",
            self.retry_config,
            || async {
                link::Entity::find()
                    .join(JoinType::InnerJoin, link::Relation::Organization.def())
                    .join(JoinType::InnerJoin, link::Relation::CustomDomain.def())
                    .filter(Self::live_link_condition(now))
                    .filter(Self::org_alive_condition())
                    .filter(lower_eq(
                        (custom_domain::Entity, custom_domain::Column::Hostname),
                        &hostname,
                    ))
                    .filter(lower_eq((link::Entity, link::Column::Slug), &slug))
                    // 唯一性被破坏时按最早创建的取，保证确定性
                    .order_by_asc(link::Column::CreatedAt)
                    .order_by_asc(link::Column::Id)
                    .one(db)
                    .await
            },
        )
        .await
        .map_err(ShortspaceError::from)?;

        Ok(model.map(model_to_resolved_link))
    }

    /// Step 2b: domain-less link owned by an organization whose primary
    /// domain matches the request host.
    pub async fn find_link_by_primary_domain(
        &self,
        host: &str,
        slug: &str,
    ) -> Result<Option<ResolvedLink>> {
        let now = Utc::now();
        let db = &self.db;
        let host = host.to_string();
        let slug = slug.to_string();

        let model = retry::with_retry(
            "find_link_by_primary_domain",
            self.retry_config,
            || async {
                link::Entity::find()
                    .join(JoinType::InnerJoin, link::Relation::Organization.def())
                    .filter(Self::live_link_condition(now))
                    .filter(Self::org_alive_condition())
                    .filter(link::Column::DomainId.is_null())
                    .filter(lower_eq(
                        (organization::Entity, organization::Column::PrimaryDomain),
                        &host,
                    ))
                    .filter(lower_eq((link::Entity, link::Column::Slug), &slug))
                    .order_by_asc(link::Column::CreatedAt)
                    .order_by_asc(link::Column::Id)
                    .one(db)
                    .await
            },
        )
        .await
        .map_err(ShortspaceError::from)?;

        Ok(model.map(model_to_resolved_link))
    }

    /// Step 3: domain-less link matched purely by slug, independent of host.
    pub async fn find_link_by_slug_only(&self, slug: &str) -> Result<Option<ResolvedLink>> {
        let now = Utc::now();
        let db = &self.db;
        let slug = slug.to_string();

        let model = retry::with_retry("find_link_by_slug_only", self.retry_config, || async {
            link::Entity::find()
                .join(JoinType::InnerJoin, link::Relation::Organization.def())
                .filter(Self::live_link_condition(now))
                .filter(Self::org_alive_condition())
                .filter(link::Column::DomainId.is_null())
                .filter(lower_eq((link::Entity, link::Column::Slug), &slug))
                .order_by_asc(link::Column::CreatedAt)
                .order_by_asc(link::Column::Id)
                .one(db)
                .await
        })
        .await
        .map_err(ShortspaceError::from)?;

        Ok(model.map(model_to_resolved_link))
    }

    /// 查询组织（软删除的组织视为不存在）
    pub async fn get_organization(&self, id: &str) -> Result<Option<Organization>> {
        let db = &self.db;
        let id = id.to_string();

        let model = retry::with_retry("get_organization", self.retry_config, || async {
            organization::Entity::find_by_id(&id)
                .filter(organization::Column::DeletedAt.is_null())
                .one(db)
                .await
        })
        .await
        .map_err(ShortspaceError::from)?;

        Ok(model.map(model_to_organization))
    }

    pub async fn get_link(&self, id: &str) -> Result<Option<Link>> {
        let db = &self.db;
        let id = id.to_string();

        let model = retry::with_retry("get_link", self.retry_config, || async {
            link::Entity::find_by_id(&id).one(db).await
        })
        .await
        .map_err(ShortspaceError::from)?;

        Ok(model.map(model_to_link))
    }

    /// 统计组织在 `since` 之后创建的链接数（月度配额用）
    pub async fn count_links_created_since(
        &self,
        organization_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u64> {
        let db = &self.db;
        let organization_id = organization_id.to_string();

        retry::with_retry("count_links_created_since", self.retry_config, || async {
            link::Entity::find()
                .filter(link::Column::OrganizationId.eq(&organization_id))
                .filter(link::Column::CreatedAt.gte(since))
                .count(db)
                .await
        })
        .await
        .map_err(ShortspaceError::from)
    }

    pub async fn count_custom_domains(&self, organization_id: &str) -> Result<u64> {
        let db = &self.db;
        let organization_id = organization_id.to_string();

        retry::with_retry("count_custom_domains", self.retry_config, || async {
            custom_domain::Entity::find()
                .filter(custom_domain::Column::OrganizationId.eq(&organization_id))
                .count(db)
                .await
        })
        .await
        .map_err(ShortspaceError::from)
    }

    /// 将已过期但仍 ACTIVE 的链接批量置为 EXPIRED，返回影响行数
    pub async fn purge_expired_links(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = link::Entity::update_many()
            .col_expr(
                link::Column::Status,
                Expr::value(LinkStatus::Expired.as_str()),
            )
            .filter(link::Column::Status.eq(LinkStatus::Active.as_str()))
            .filter(link::Column::ExpiresAt.is_not_null())
            .filter(link::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await
            .map_err(ShortspaceError::from)?;

        if result.rows_affected > 0 {
            info!("Expired {} overdue links", result.rows_affected);
        }
        Ok(result.rows_affected)
    }
}
