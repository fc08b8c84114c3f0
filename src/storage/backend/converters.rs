use crate::storage::models::{
    Link, LinkStatus, Organization, OrganizationStatus, PlanTier, ResolvedLink,
};
use migration::entities::{link, organization};

/// 将 Sea-ORM Model 转换为 Organization
pub fn model_to_organization(model: organization::Model) -> Organization {
    Organization {
        id: model.id,
        slug: model.slug,
        plan_tier: PlanTier::parse(&model.plan_tier),
        primary_domain: model.primary_domain,
        status: OrganizationStatus::parse(&model.status),
        deleted_at: model.deleted_at,
        created_at: model.created_at,
    }
}

/// 将 Sea-ORM Model 转换为 Link
pub fn model_to_link(model: link::Model) -> Link {
    Link {
        id: model.id,
        organization_id: model.organization_id,
        domain_id: model.domain_id,
        slug: model.slug,
        destination_url: model.destination_url,
        status: LinkStatus::parse(&model.status),
        expires_at: model.expires_at,
        click_count: model.click_count.max(0) as u64,
        unique_visitors: model.unique_visitors.max(0) as u64,
        last_clicked_at: model.last_clicked_at,
        created_at: model.created_at,
    }
}

/// 重定向路径只需要的最小投影
pub fn model_to_resolved_link(model: link::Model) -> ResolvedLink {
    ResolvedLink {
        id: model.id,
        organization_id: model.organization_id,
        slug: model.slug,
        destination_url: model.destination_url,
    }
}
