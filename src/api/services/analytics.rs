//! Analytics snapshot endpoint, consumed by the dashboard.

use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::services::AnalyticsService;

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// GET /api/v1/orgs/{org_id}/analytics?from=&to=
///
/// 不带参数时默认最近 30 天。
pub async fn org_analytics(
    path: web::Path<String>,
    query: web::Query<RangeQuery>,
    service: web::Data<AnalyticsService>,
) -> impl Responder {
    let organization_id = path.into_inner();

    let (from, to) = match AnalyticsService::parse_date_range_strict(
        query.from.as_deref(),
        query.to.as_deref(),
    ) {
        Ok(range) => range,
        Err(e) => {
            return HttpResponse::BadRequest().json(json!({
                "code": e.code(),
                "error": e.message(),
            }));
        }
    };

    match service.snapshot(&organization_id, from, to).await {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(e) => {
            error!(
                "Analytics snapshot failed for org {}: {}",
                organization_id, e
            );
            // 聚合失败对调用方呈现为笼统的计算错误
            HttpResponse::InternalServerError().json(json!({
                "code": e.code(),
                "error": "analytics computation failed",
            }))
        }
    }
}
