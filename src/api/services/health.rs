use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::{error, trace};

use crate::storage::SeaOrmStorage;

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        storage: web::Data<Arc<SeaOrmStorage>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received health check request");

        // 检查存储健康状况
        let storage_status =
            match tokio::time::timeout(Duration::from_secs(5), storage.get_db().ping()).await {
                Ok(Ok(())) => json!({
                    "status": "healthy",
                    "backend": storage.backend_name(),
                }),
                Ok(Err(e)) => {
                    error!("Storage ping failed: {}", e);
                    json!({
                        "status": "unhealthy",
                        "error": e.to_string(),
                        "backend": storage.backend_name(),
                    })
                }
                Err(_) => {
                    error!("Storage ping timeout");
                    json!({
                        "status": "unhealthy",
                        "error": "timeout",
                        "backend": storage.backend_name(),
                    })
                }
            };

        let now = chrono::Utc::now();
        let uptime_seconds = (now - app_start_time.start_datetime).num_seconds().max(0) as u64;
        let is_healthy = storage_status["status"] == "healthy";

        let health_response = json!({
            "status": if is_healthy { "healthy" } else { "unhealthy" },
            "timestamp": now.to_rfc3339(),
            "uptime": uptime_seconds,
            "checks": {
                "storage": storage_status,
            },
            "response_time_ms": start_time.elapsed().as_millis() as u64,
        });

        let response_status = if is_healthy {
            actix_web::http::StatusCode::OK
        } else {
            actix_web::http::StatusCode::SERVICE_UNAVAILABLE
        };

        HttpResponse::build(response_status).json(health_response)
    }

    pub async fn liveness_check() -> impl Responder {
        HttpResponse::Ok().json(json!({ "status": "alive" }))
    }

    pub async fn readiness_check(storage: web::Data<Arc<SeaOrmStorage>>) -> impl Responder {
        match storage.get_db().ping().await {
            Ok(()) => HttpResponse::Ok().json(json!({ "status": "ready" })),
            Err(e) => {
                error!("Readiness check failed: {}", e);
                HttpResponse::ServiceUnavailable().json(json!({ "status": "not ready" }))
            }
        }
    }
}

/// Health 路由配置
pub fn health_routes() -> actix_web::Scope {
    use actix_web::web;

    web::scope("")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
        .route("/live", web::get().to(HealthService::liveness_check))
        .route("/ready", web::get().to(HealthService::readiness_check))
}
