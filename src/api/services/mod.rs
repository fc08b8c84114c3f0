pub mod analytics;
pub mod health;
pub mod quota;
pub mod redirect;

pub use health::{AppStartTime, HealthService, health_routes};
pub use redirect::{RedirectService, redirect_routes};

/// 内部 API 路由（仪表盘消费；认证由前置网关处理）
pub fn api_v1_routes() -> actix_web::Scope {
    use actix_web::web;

    web::scope("")
        .route(
            "/orgs/{org_id}/analytics",
            web::get().to(analytics::org_analytics),
        )
        .route("/orgs/{org_id}/quota", web::get().to(quota::org_quota))
}
