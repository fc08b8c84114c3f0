//! Plan quota ledger
//!
//! Advisory pre-conditions evaluated by the (external) link/domain creation
//! actions. Limits are a fixed function of the plan tier; counts come from
//! the repository. Concurrent creations can race past a limit by a small
//! margin; callers accept that and this ledger does not try to close it.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use tracing::debug;

use crate::errors::Result;
use crate::storage::{PlanTier, SeaOrmStorage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyticsLevel {
    Basic,
    Advanced,
}

/// Derived limits for a plan tier. Not a stored entity; recomputed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanLimits {
    /// None = unlimited
    pub link_create_limit_per_month: Option<u32>,
    pub allow_custom_domains: bool,
    pub custom_domain_allowance: u32,
    pub analytics_level: AnalyticsLevel,
}

impl PlanLimits {
    /// 固定限额表，运行期不可编辑
    pub fn for_tier(tier: PlanTier) -> Self {
        match tier {
            PlanTier::Free => PlanLimits {
                link_create_limit_per_month: Some(10),
                allow_custom_domains: false,
                custom_domain_allowance: 0,
                analytics_level: AnalyticsLevel::Basic,
            },
            PlanTier::Pro => PlanLimits {
                link_create_limit_per_month: None,
                allow_custom_domains: true,
                custom_domain_allowance: 3,
                analytics_level: AnalyticsLevel::Advanced,
            },
        }
    }
}

/// 当前自然月起点（UTC，与计数口径保持一致）
pub fn start_of_current_month(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .with_day(1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        // day 1 永远合法，这个分支不会走到
        .unwrap_or(now)
}

#[derive(Debug, Clone, Serialize)]
pub struct QuotaUsage {
    pub links_this_month: u64,
    pub custom_domains: u64,
}

pub struct QuotaLedger {
    storage: Arc<SeaOrmStorage>,
}

impl QuotaLedger {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 本月已创建数达到计划上限则拒绝；无上限计划直接放行
    pub async fn can_create_link(&self, organization_id: &str, tier: PlanTier) -> Result<bool> {
        let limits = PlanLimits::for_tier(tier);
        let Some(cap) = limits.link_create_limit_per_month else {
            return Ok(true);
        };

        let since = start_of_current_month(Utc::now());
        let created = self
            .storage
            .count_links_created_since(organization_id, since)
            .await?;

        debug!(
            "Quota: org {} created {}/{} links this month",
            organization_id, created, cap
        );
        Ok(created < cap as u64)
    }

    /// 计划不允许自定义域时直接拒绝，否则检查存量额度
    pub async fn can_add_domain(&self, organization_id: &str, tier: PlanTier) -> Result<bool> {
        let limits = PlanLimits::for_tier(tier);
        if !limits.allow_custom_domains {
            return Ok(false);
        }

        let existing = self.storage.count_custom_domains(organization_id).await?;
        Ok(existing < limits.custom_domain_allowance as u64)
    }

    pub async fn usage(&self, organization_id: &str) -> Result<QuotaUsage> {
        let since = start_of_current_month(Utc::now());
        let links_this_month = self
            .storage
            .count_links_created_since(organization_id, since)
            .await?;
        let custom_domains = self.storage.count_custom_domains(organization_id).await?;

        Ok(QuotaUsage {
            links_this_month,
            custom_domains,
        })
    }
}
