//! Internal API tests: health probes, analytics snapshot and quota endpoints.

mod common;

use std::sync::Arc;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use chrono::Utc;

use common::{LinkSeed, OrgSeed, new_storage, seed_link, seed_org};
use shortspace::analytics::{ClickContext, ClickRecorder};
use shortspace::api::services::{AppStartTime, api_v1_routes, health_routes};
use shortspace::services::{AnalyticsService, QuotaLedger};
use shortspace::storage::SeaOrmStorage;

fn api_data(
    storage: &Arc<SeaOrmStorage>,
) -> (
    web::Data<Arc<SeaOrmStorage>>,
    web::Data<AnalyticsService>,
    web::Data<QuotaLedger>,
    web::Data<AppStartTime>,
) {
    (
        web::Data::new(Arc::clone(storage)),
        web::Data::new(AnalyticsService::new(Arc::clone(storage))),
        web::Data::new(QuotaLedger::new(Arc::clone(storage))),
        web::Data::new(AppStartTime {
            start_datetime: Utc::now(),
        }),
    )
}

#[actix_web::test]
async fn test_health_endpoints() {
    let (storage, _dir) = new_storage().await;
    let (storage_data, analytics, quota, start_time) = api_data(&storage);

    let app = test::init_service(
        App::new()
            .app_data(storage_data)
            .app_data(analytics)
            .app_data(quota)
            .app_data(start_time)
            .service(web::scope("/health").service(health_routes())),
    )
    .await;

    let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["storage"]["backend"], "sqlite");

    let resp = test::call_service(&app, TestRequest::get().uri("/health/live").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, TestRequest::get().uri("/health/ready").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_analytics_endpoint_returns_snapshot() {
    let (storage, _dir) = new_storage().await;
    seed_org(&storage, OrgSeed::default()).await;
    seed_link(&storage, LinkSeed::default()).await;

    // 造两次点击
    let recorder = ClickRecorder::new(storage.as_event_sink(), Duration::from_secs(3600), 1_000_000);
    recorder.record(
        "lnk_launch",
        ClickContext {
            ip: Some("203.0.113.9".to_string()),
            ..Default::default()
        },
    );
    recorder.record(
        "lnk_launch",
        ClickContext {
            ip: Some("203.0.113.9".to_string()),
            ..Default::default()
        },
    );
    recorder.flush().await;

    let (storage_data, analytics, quota, start_time) = api_data(&storage);
    let app = test::init_service(
        App::new()
            .app_data(storage_data)
            .app_data(analytics)
            .app_data(quota)
            .app_data(start_time)
            .service(web::scope("/api/v1").service(api_v1_routes())),
    )
    .await;

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/v1/orgs/org_acme/analytics")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["total_clicks"], 2);
    assert_eq!(body["unique_visitors"], 1);
    assert_eq!(body["top_links"][0]["slug"], "launch");
    assert!(body["timeline"].as_array().is_some());
}

#[actix_web::test]
async fn test_analytics_endpoint_rejects_bad_range() {
    let (storage, _dir) = new_storage().await;
    let (storage_data, analytics, quota, start_time) = api_data(&storage);

    let app = test::init_service(
        App::new()
            .app_data(storage_data)
            .app_data(analytics)
            .app_data(quota)
            .app_data(start_time)
            .service(web::scope("/api/v1").service(api_v1_routes())),
    )
    .await;

    // 起点晚于终点
    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/v1/orgs/org_acme/analytics?from=2026-03-10&to=2026-03-01")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // 只给一端
    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/v1/orgs/org_acme/analytics?from=2026-03-01")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_quota_endpoint_reports_allowances() {
    let (storage, _dir) = new_storage().await;
    seed_org(&storage, OrgSeed::default()).await;
    for i in 0..10 {
        seed_link(
            &storage,
            LinkSeed {
                id: Box::leak(format!("lnk_{}", i).into_boxed_str()),
                slug: Box::leak(format!("slug-{}", i).into_boxed_str()),
                ..Default::default()
            },
        )
        .await;
    }

    let (storage_data, analytics, quota, start_time) = api_data(&storage);
    let app = test::init_service(
        App::new()
            .app_data(storage_data)
            .app_data(analytics)
            .app_data(quota)
            .app_data(start_time)
            .service(web::scope("/api/v1").service(api_v1_routes())),
    )
    .await;

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/api/v1/orgs/org_acme/quota").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["plan"], "free");
    assert_eq!(body["can_create_link"], false);
    assert_eq!(body["can_add_domain"], false);
    assert_eq!(body["usage"]["links_this_month"], 10);
    assert_eq!(body["limits"]["link_create_limit_per_month"], 10);
}

#[actix_web::test]
async fn test_quota_endpoint_404_for_unknown_or_deleted_org() {
    let (storage, _dir) = new_storage().await;
    seed_org(
        &storage,
        OrgSeed {
            id: "org_gone",
            slug: "gone",
            deleted_at: Some(Utc::now()),
            ..Default::default()
        },
    )
    .await;

    let (storage_data, analytics, quota, start_time) = api_data(&storage);
    let app = test::init_service(
        App::new()
            .app_data(storage_data)
            .app_data(analytics)
            .app_data(quota)
            .app_data(start_time)
            .service(web::scope("/api/v1").service(api_v1_routes())),
    )
    .await;

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/api/v1/orgs/org_missing/quota").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // 软删除的组织同样 404
    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/api/v1/orgs/org_gone/quota").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
