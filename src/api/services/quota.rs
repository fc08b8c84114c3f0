//! Quota pre-check endpoint for the dashboard's link/domain creation forms.

use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::error;

use crate::services::QuotaLedger;
use crate::services::quota::PlanLimits;
use crate::storage::SeaOrmStorage;

/// GET /api/v1/orgs/{org_id}/quota
///
/// 检查是建议性的：并发创建仍可能小幅超限，由调用方接受。
pub async fn org_quota(
    path: web::Path<String>,
    storage: web::Data<Arc<SeaOrmStorage>>,
    ledger: web::Data<QuotaLedger>,
) -> impl Responder {
    let organization_id = path.into_inner();

    // 软删除的组织视为不存在
    let org = match storage.get_organization(&organization_id).await {
        Ok(Some(org)) => org,
        Ok(None) => {
            return HttpResponse::NotFound().json(json!({
                "error": "organization not found",
            }));
        }
        Err(e) => {
            error!("Organization lookup failed for {}: {}", organization_id, e);
            return HttpResponse::InternalServerError().json(json!({
                "error": "storage unavailable",
            }));
        }
    };

    let result = tokio::try_join!(
        ledger.can_create_link(&org.id, org.plan_tier),
        ledger.can_add_domain(&org.id, org.plan_tier),
        ledger.usage(&org.id),
    );

    match result {
        Ok((can_create_link, can_add_domain, usage)) => HttpResponse::Ok().json(json!({
            "plan": org.plan_tier,
            "limits": PlanLimits::for_tier(org.plan_tier),
            "can_create_link": can_create_link,
            "can_add_domain": can_add_domain,
            "usage": usage,
        })),
        Err(e) => {
            error!("Quota evaluation failed for {}: {}", organization_id, e);
            HttpResponse::InternalServerError().json(json!({
                "error": "quota evaluation failed",
            }))
        }
    }
}
