//! Redirect endpoint tests
//!
//! The full request path: segment parsing, static overrides, resolution,
//! response headers, and the GET-records / HEAD-does-not contract.

mod common;

use std::sync::Arc;
use std::time::Duration;

use actix_web::http::{Method, StatusCode};
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use sea_orm::{EntityTrait, PaginatorTrait};

use common::{LinkSeed, OrgSeed, new_storage, seed_domain, seed_link, seed_org};
use migration::entities::click_event;
use shortspace::analytics::ClickRecorder;
use shortspace::api::services::redirect_routes;
use shortspace::config::AnalyticsConfig;
use shortspace::services::{GeoIpProvider, Resolver};
use shortspace::storage::SeaOrmStorage;

fn app_components(
    storage: &Arc<SeaOrmStorage>,
) -> (
    web::Data<Resolver>,
    web::Data<Arc<ClickRecorder>>,
    web::Data<Arc<GeoIpProvider>>,
) {
    let recorder = Arc::new(ClickRecorder::new(
        storage.as_event_sink(),
        Duration::from_secs(3600),
        1_000_000,
    ));
    // 测试里 geo lookup 关闭
    let geoip = Arc::new(GeoIpProvider::new(&AnalyticsConfig::default()));
    (
        web::Data::new(Resolver::new(Arc::clone(storage))),
        web::Data::new(recorder),
        web::Data::new(geoip),
    )
}

/// 等待 dispatch_click 的后台任务跑完，再把缓冲区刷进数据库
async fn settle_and_flush(recorder: &web::Data<Arc<ClickRecorder>>) {
    tokio::time::sleep(Duration::from_millis(50)).await;
    recorder.flush().await;
}

#[actix_web::test]
async fn test_redirect_sends_302_with_no_store() {
    let (storage, _dir) = new_storage().await;
    seed_org(&storage, OrgSeed::default()).await;
    seed_link(&storage, LinkSeed::default()).await;
    let (resolver, recorder, geoip) = app_components(&storage);

    let app = test::init_service(
        App::new()
            .app_data(resolver)
            .app_data(recorder)
            .app_data(geoip)
            .service(redirect_routes()),
    )
    .await;

    let resp = test::call_service(&app, TestRequest::get().uri("/launch").to_request()).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get("Location").unwrap(),
        "https://example.com/launch"
    );
    assert_eq!(
        resp.headers().get("Cache-Control").unwrap(),
        "no-store, max-age=0"
    );
}

#[actix_web::test]
async fn test_unknown_slug_is_404_with_empty_body() {
    let (storage, _dir) = new_storage().await;
    seed_org(&storage, OrgSeed::default()).await;
    let (resolver, recorder, geoip) = app_components(&storage);

    let app = test::init_service(
        App::new()
            .app_data(resolver)
            .app_data(recorder)
            .app_data(geoip)
            .service(redirect_routes()),
    )
    .await;

    let resp = test::call_service(&app, TestRequest::get().uri("/nope").to_request()).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        resp.headers().get("Cache-Control").unwrap(),
        "no-store, max-age=0"
    );
    let body = test::read_body(resp).await;
    assert!(body.is_empty());
}

#[actix_web::test]
async fn test_more_than_two_segments_is_404() {
    let (storage, _dir) = new_storage().await;
    seed_org(&storage, OrgSeed::default()).await;
    seed_link(&storage, LinkSeed::default()).await;
    let (resolver, recorder, geoip) = app_components(&storage);

    let app = test::init_service(
        App::new()
            .app_data(resolver)
            .app_data(recorder)
            .app_data(geoip)
            .service(redirect_routes()),
    )
    .await;

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/a/b/launch").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_path_domain_claim_without_domain_is_404() {
    let (storage, _dir) = new_storage().await;
    seed_org(&storage, OrgSeed::default()).await;
    // slug 匹配的无绑定域链接存在，但路径声明的域不存在
    seed_link(
        &storage,
        LinkSeed {
            slug: "promo",
            ..Default::default()
        },
    )
    .await;
    let (resolver, recorder, geoip) = app_components(&storage);

    let app = test::init_service(
        App::new()
            .app_data(resolver)
            .app_data(recorder)
            .app_data(geoip)
            .service(redirect_routes()),
    )
    .await;

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/acme.example/promo").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_two_segment_path_resolves_custom_domain() {
    let (storage, _dir) = new_storage().await;
    seed_org(&storage, OrgSeed::default()).await;
    seed_domain(&storage, "dom_go", "org_acme", "go.acme.example").await;
    seed_link(
        &storage,
        LinkSeed {
            id: "lnk_bound",
            domain_id: Some("dom_go"),
            slug: "promo",
            destination_url: "https://acme.example/promo",
            ..Default::default()
        },
    )
    .await;
    let (resolver, recorder, geoip) = app_components(&storage);

    let app = test::init_service(
        App::new()
            .app_data(resolver)
            .app_data(recorder)
            .app_data(geoip)
            .service(redirect_routes()),
    )
    .await;

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/go.acme.example/promo").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get("Location").unwrap(),
        "https://acme.example/promo"
    );
}

#[actix_web::test]
async fn test_forwarded_host_wins_over_host_header() {
    let (storage, _dir) = new_storage().await;
    seed_org(&storage, OrgSeed::default()).await;
    seed_domain(&storage, "dom_go", "org_acme", "go.acme.example").await;
    seed_link(
        &storage,
        LinkSeed {
            id: "lnk_bound",
            domain_id: Some("dom_go"),
            slug: "sale",
            destination_url: "https://acme.example/sale",
            ..Default::default()
        },
    )
    .await;
    let (resolver, recorder, geoip) = app_components(&storage);

    let app = test::init_service(
        App::new()
            .app_data(resolver)
            .app_data(recorder)
            .app_data(geoip)
            .service(redirect_routes()),
    )
    .await;

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/sale")
            .insert_header(("Host", "edge-proxy.internal"))
            .insert_header(("X-Forwarded-Host", "go.acme.example"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[actix_web::test]
async fn test_static_override_redirects_without_lookup() {
    let (storage, _dir) = new_storage().await;
    let (resolver, recorder, geoip) = app_components(&storage);

    let app = test::init_service(
        App::new()
            .app_data(resolver)
            .app_data(recorder.clone())
            .app_data(geoip)
            .service(redirect_routes()),
    )
    .await;

    let resp = test::call_service(&app, TestRequest::get().uri("/source").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get("Location").unwrap(),
        "https://github.com/shortspace/shortspace"
    );

    // 保留 slug 不产生点击记录
    settle_and_flush(&recorder).await;
    let events = click_event::Entity::find()
        .count(storage.get_db())
        .await
        .unwrap();
    assert_eq!(events, 0);
}

#[actix_web::test]
async fn test_static_override_ignored_with_path_domain() {
    let (storage, _dir) = new_storage().await;
    seed_org(&storage, OrgSeed::default()).await;
    let (resolver, recorder, geoip) = app_components(&storage);

    let app = test::init_service(
        App::new()
            .app_data(resolver)
            .app_data(recorder)
            .app_data(geoip)
            .service(redirect_routes()),
    )
    .await;

    // 带显式域名段时保留 slug 不生效，走正常解析 → 404
    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/acme.example/source").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_get_records_click_with_context() {
    let (storage, _dir) = new_storage().await;
    seed_org(&storage, OrgSeed::default()).await;
    seed_link(&storage, LinkSeed::default()).await;
    let (resolver, recorder, geoip) = app_components(&storage);

    let app = test::init_service(
        App::new()
            .app_data(resolver)
            .app_data(recorder.clone())
            .app_data(geoip)
            .service(redirect_routes()),
    )
    .await;

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/launch?utm_source=newsletter&utm_campaign=spring&utm_term=%20")
            .insert_header(("X-Forwarded-For", "203.0.113.9, 10.0.0.1"))
            .insert_header(("Referer", "https://news.site/roundup"))
            .insert_header(("User-Agent", "Mozilla/5.0"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    settle_and_flush(&recorder).await;

    let link = storage.get_link("lnk_launch").await.unwrap().unwrap();
    assert_eq!(link.click_count, 1);
    assert_eq!(link.unique_visitors, 1);

    let event = click_event::Entity::find()
        .one(storage.get_db())
        .await
        .unwrap()
        .expect("click event must be recorded");
    assert_eq!(event.utm_source.as_deref(), Some("newsletter"));
    assert_eq!(event.utm_campaign.as_deref(), Some("spring"));
    // 空白 UTM 值按缺失处理
    assert!(event.utm_term.is_none());
    assert_eq!(event.referrer.as_deref(), Some("https://news.site/roundup"));
    // XFF 第一个条目被指纹化
    assert!(event.ip_hash.is_some());
}

#[actix_web::test]
async fn test_head_redirects_but_does_not_record() {
    let (storage, _dir) = new_storage().await;
    seed_org(&storage, OrgSeed::default()).await;
    seed_link(&storage, LinkSeed::default()).await;
    let (resolver, recorder, geoip) = app_components(&storage);

    let app = test::init_service(
        App::new()
            .app_data(resolver)
            .app_data(recorder.clone())
            .app_data(geoip)
            .service(redirect_routes()),
    )
    .await;

    let resp = test::call_service(
        &app,
        TestRequest::default()
            .method(Method::HEAD)
            .uri("/launch")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get("Location").unwrap(),
        "https://example.com/launch"
    );

    settle_and_flush(&recorder).await;

    // 健康探测不污染统计
    let link = storage.get_link("lnk_launch").await.unwrap().unwrap();
    assert_eq!(link.click_count, 0);
    assert_eq!(link.unique_visitors, 0);
    let events = click_event::Entity::find()
        .count(storage.get_db())
        .await
        .unwrap();
    assert_eq!(events, 0);
}

#[actix_web::test]
async fn test_expired_link_is_404() {
    let (storage, _dir) = new_storage().await;
    seed_org(&storage, OrgSeed::default()).await;
    seed_link(
        &storage,
        LinkSeed {
            expires_at: Some(chrono::Utc::now() - chrono::Duration::seconds(1)),
            ..Default::default()
        },
    )
    .await;
    let (resolver, recorder, geoip) = app_components(&storage);

    let app = test::init_service(
        App::new()
            .app_data(resolver)
            .app_data(recorder)
            .app_data(geoip)
            .service(redirect_routes()),
    )
    .await;

    let resp = test::call_service(&app, TestRequest::get().uri("/launch").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
