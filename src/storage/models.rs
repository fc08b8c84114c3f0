use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Billing tier controlling quota and analytics depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Pro,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Pro => "pro",
        }
    }

    /// 未知值按 FREE 处理（与来源系统一致的保守默认）
    pub fn parse(value: &str) -> Self {
        match value {
            "pro" => PlanTier::Pro,
            _ => PlanTier::Free,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Active,
    Expired,
    Archived,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Active => "active",
            LinkStatus::Expired => "expired",
            LinkStatus::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "expired" => LinkStatus::Expired,
            "archived" => LinkStatus::Archived,
            _ => LinkStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationStatus {
    Active,
    Suspended,
}

impl OrganizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationStatus::Active => "active",
            OrganizationStatus::Suspended => "suspended",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "suspended" => OrganizationStatus::Suspended,
            _ => OrganizationStatus::Active,
        }
    }
}

/// Tenant root record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub slug: String,
    pub plan_tier: PlanTier,
    pub primary_domain: Option<String>,
    pub status: OrganizationStatus,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Organization {
    /// 软删除的组织不参与任何解析；挂起状态不排除
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub organization_id: String,
    pub domain_id: Option<String>,
    pub slug: String,
    pub destination_url: String,
    pub status: LinkStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub click_count: u64,
    pub unique_visitors: u64,
    pub last_clicked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// The minimal projection the redirect path needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub id: String,
    pub organization_id: String,
    pub slug: String,
    pub destination_url: String,
}
