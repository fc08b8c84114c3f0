//! Analytics 相关的数据库查询
//!
//! 提供点击事件的范围查询，供 AnalyticsService 聚合使用。

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait,
};

use super::{SeaOrmStorage, retry};
use crate::errors::{Result, ShortspaceError};

use migration::entities::{click_event, link};

/// 组织范围内的单条点击事件行（含链接元数据）
#[derive(Debug, Clone, FromQueryResult)]
pub struct OrgClickRow {
    pub id: i64,
    pub link_id: String,
    pub occurred_at: DateTime<Utc>,
    pub referrer: Option<String>,
    pub country: Option<String>,
    pub ip_hash: Option<String>,
    pub link_slug: String,
    pub link_destination: String,
}

impl SeaOrmStorage {
    /// 取组织在 [from, to] 范围内的全部点击事件
    ///
    /// 按 (occurred_at, id) 升序返回，即插入顺序——聚合层依赖这个顺序
    /// 做确定性的同分排序。
    pub async fn fetch_org_clicks(
        &self,
        organization_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<OrgClickRow>> {
        let db = &self.db;
        let organization_id = organization_id.to_string();

        retry::with_retry("fetch_org_clicks", self.retry_config, || async {
            click_event::Entity::find()
                .select_only()
                .column(click_event::Column::Id)
                .column(click_event::Column::LinkId)
                .column(click_event::Column::OccurredAt)
                .column(click_event::Column::Referrer)
                .column(click_event::Column::Country)
                .column(click_event::Column::IpHash)
                .column_as(Expr::col((link::Entity, link::Column::Slug)), "link_slug")
                .column_as(
                    Expr::col((link::Entity, link::Column::DestinationUrl)),
                    "link_destination",
                )
                .join(JoinType::InnerJoin, click_event::Relation::Link.def())
                .filter(link::Column::OrganizationId.eq(&organization_id))
                .filter(click_event::Column::OccurredAt.gte(from))
                .filter(click_event::Column::OccurredAt.lte(to))
                .order_by_asc(click_event::Column::OccurredAt)
                .order_by_asc(click_event::Column::Id)
                .into_model::<OrgClickRow>()
                .all(db)
                .await
        })
        .await
        .map_err(ShortspaceError::from)
    }

    /// 统计组织在范围内的点击事件数
    pub async fn count_click_events_in_range(
        &self,
        organization_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64> {
        let db = &self.db;
        let organization_id = organization_id.to_string();

        retry::with_retry(
            "count_click_events_in_range",
            self.retry_config,
            || async {
                click_event::Entity::find()
                    .join(JoinType::InnerJoin, click_event::Relation::Link.def())
                    .filter(link::Column::OrganizationId.eq(&organization_id))
                    .filter(click_event::Column::OccurredAt.gte(from))
                    .filter(click_event::Column::OccurredAt.lte(to))
                    .count(db)
                    .await
            },
        )
        .await
        .map_err(ShortspaceError::from)
    }
}
