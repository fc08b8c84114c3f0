//! EventSink implementation for SeaOrmStorage
//!
//! Persists click batches and keeps the denormalized link counters in step:
//! click_count/last_clicked_at via a single CASE WHEN batch update, and
//! unique_visitors via an `INSERT ... ON CONFLICT DO NOTHING` probe against
//! the unique (link_id, fingerprint) constraint. The constraint is what makes
//! concurrent first-clicks from the same visitor increment exactly once.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{CaseStatement, Expr, OnConflict, Query};
use sea_orm::{ActiveValue::Set, ConnectionTrait, EntityTrait, ExprTrait};
use tracing::debug;
use woothee::parser::Parser;

use super::{SeaOrmStorage, retry};
use crate::analytics::{ClickRecord, EventSink};

use migration::entities::{click_event, click_visitor, link};

/// 单链接批次增量
struct LinkDelta {
    clicks: i64,
    last_clicked_at: DateTime<Utc>,
    new_uniques: i64,
}

#[async_trait]
impl EventSink for SeaOrmStorage {
    async fn persist_clicks(&self, records: Vec<ClickRecord>) -> anyhow::Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let total_count = records.len();
        let ua_parser = Parser::new();

        // 1. 批量插入 click_events
        let models: Vec<click_event::ActiveModel> = records
            .iter()
            .map(|record| {
                let parsed = record.user_agent.as_deref().and_then(|ua| ua_parser.parse(ua));
                click_event::ActiveModel {
                    link_id: Set(record.link_id.clone()),
                    occurred_at: Set(record.occurred_at),
                    referrer: Set(record.referrer.clone()),
                    country: Set(record.country.clone()),
                    region: Set(record.region.clone()),
                    city: Set(record.city.clone()),
                    user_agent: Set(record.user_agent.clone()),
                    device_type: Set(parsed.as_ref().map(|p| p.category.to_string())),
                    browser: Set(parsed.as_ref().map(|p| p.name.to_string())),
                    os: Set(parsed.as_ref().map(|p| p.os.to_string())),
                    ip_hash: Set(record.fingerprint.clone()),
                    utm_source: Set(record.utm_source.clone()),
                    utm_medium: Set(record.utm_medium.clone()),
                    utm_campaign: Set(record.utm_campaign.clone()),
                    utm_term: Set(record.utm_term.clone()),
                    utm_content: Set(record.utm_content.clone()),
                    ..Default::default()
                }
            })
            .collect();

        let db = &self.db;
        retry::with_retry("persist_clicks(insert)", self.retry_config, || async {
            click_event::Entity::insert_many(models.clone()).exec(db).await
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to batch insert click events: {}", e))?;

        // 2. 汇总每个链接的增量（BTreeMap 保证生成 SQL 的确定性）
        let mut deltas: BTreeMap<String, LinkDelta> = BTreeMap::new();
        for record in &records {
            let delta = deltas.entry(record.link_id.clone()).or_insert(LinkDelta {
                clicks: 0,
                last_clicked_at: record.occurred_at,
                new_uniques: 0,
            });
            delta.clicks += 1;
            if record.occurred_at > delta.last_clicked_at {
                delta.last_clicked_at = record.occurred_at;
            }
        }

        // 3. unique visitor 判定
        //
        // 无指纹的点击每次都算新访客（匿名客户端的刻意多计策略）；
        // 有指纹的点击只在 (link, fingerprint) 首次出现时 +1，由唯一约束裁决。
        for record in &records {
            let counts_as_unique = match &record.fingerprint {
                None => true,
                Some(fingerprint) => {
                    self.mark_visitor_first_seen(
                        &record.link_id,
                        fingerprint,
                        record.occurred_at,
                    )
                    .await?
                }
            };
            if counts_as_unique
                && let Some(delta) = deltas.get_mut(&record.link_id)
            {
                delta.new_uniques += 1;
            }
        }

        // 4. 一次批量更新所有受影响链接的计数器
        self.apply_link_deltas(&deltas).await?;

        debug!(
            "Click events persisted to {} database ({} events, {} links)",
            self.backend_name.to_uppercase(),
            total_count,
            deltas.len()
        );

        Ok(())
    }
}

impl SeaOrmStorage {
    /// 原子判定 (link, fingerprint) 是否首次出现
    ///
    /// 返回值:
    /// - `Ok(true)`: 插入成功（首次见到该访客）
    /// - `Ok(false)`: 已存在，未执行插入
    async fn mark_visitor_first_seen(
        &self,
        link_id: &str,
        fingerprint: &str,
        seen_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let model = click_visitor::ActiveModel {
            link_id: Set(link_id.to_string()),
            fingerprint: Set(fingerprint.to_string()),
            first_seen_at: Set(seen_at),
            ..Default::default()
        };

        // ON CONFLICT DO NOTHING 实现原子性的 "insert if not exists"
        let result = click_visitor::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    click_visitor::Column::LinkId,
                    click_visitor::Column::Fingerprint,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(&self.db)
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(sea_orm::DbErr::RecordNotInserted) => Ok(false), // PostgreSQL
            Err(e) => {
                // 某些数据库后端在 do_nothing 时可能返回特定错误
                let err_str = e.to_string().to_lowercase();
                if err_str.contains("no rows") || err_str.contains("record not inserted") {
                    Ok(false)
                } else {
                    Err(anyhow::anyhow!(
                        "Failed to probe visitor fingerprint: {}",
                        e
                    ))
                }
            }
        }
    }

    /// CASE WHEN 批量更新链接计数器（跨平台兼容）
    async fn apply_link_deltas(&self, deltas: &BTreeMap<String, LinkDelta>) -> anyhow::Result<()> {
        if deltas.is_empty() {
            return Ok(());
        }

        let mut clicks_case = CaseStatement::new();
        let mut last_case = CaseStatement::new();
        let mut ids: Vec<String> = Vec::with_capacity(deltas.len());

        for (link_id, delta) in deltas {
            clicks_case = clicks_case.case(
                Expr::col(link::Column::Id).eq(Expr::val(link_id.as_str())),
                Expr::col(link::Column::ClickCount).add(Expr::val(delta.clicks)),
            );
            last_case = last_case.case(
                Expr::col(link::Column::Id).eq(Expr::val(link_id.as_str())),
                Expr::val(delta.last_clicked_at),
            );
            ids.push(link_id.clone());
        }
        // 不匹配的保持原值
        clicks_case = clicks_case.finally(Expr::col(link::Column::ClickCount));
        last_case = last_case.finally(Expr::col(link::Column::LastClickedAt));

        let stmt = Query::update()
            .table(link::Entity)
            .value(link::Column::ClickCount, clicks_case)
            .value(link::Column::LastClickedAt, last_case)
            .and_where(Expr::col(link::Column::Id).is_in(ids))
            .to_owned();

        let db = &self.db;
        let stmt_ref = &stmt;
        retry::with_retry("apply_link_deltas(clicks)", self.retry_config, || async {
            db.execute(stmt_ref).await
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to batch update click counters: {}", e))?;

        // unique_visitors 只更新有新访客的链接
        let with_uniques: Vec<(&String, i64)> = deltas
            .iter()
            .filter(|(_, d)| d.new_uniques > 0)
            .map(|(id, d)| (id, d.new_uniques))
            .collect();

        if with_uniques.is_empty() {
            return Ok(());
        }

        let mut uniques_case = CaseStatement::new();
        let mut unique_ids: Vec<String> = Vec::with_capacity(with_uniques.len());
        for (link_id, new_uniques) in &with_uniques {
            uniques_case = uniques_case.case(
                Expr::col(link::Column::Id).eq(Expr::val(link_id.as_str())),
                Expr::col(link::Column::UniqueVisitors).add(Expr::val(*new_uniques)),
            );
            unique_ids.push((*link_id).clone());
        }
        uniques_case = uniques_case.finally(Expr::col(link::Column::UniqueVisitors));

        let stmt = Query::update()
            .table(link::Entity)
            .value(link::Column::UniqueVisitors, uniques_case)
            .and_where(Expr::col(link::Column::Id).is_in(unique_ids))
            .to_owned();

        let stmt_ref = &stmt;
        retry::with_retry("apply_link_deltas(uniques)", self.retry_config, || async {
            db.execute(stmt_ref).await
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to batch update unique visitors: {}", e))?;

        Ok(())
    }
}
