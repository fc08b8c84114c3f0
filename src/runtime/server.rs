//! Server mode
//!
//! Configures and starts the HTTP server with the redirect surface, the
//! internal dashboard API and health probes, plus the two background tasks:
//! the click flush loop and the link expiry sweep.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, middleware::Compress, web};
use anyhow::Result;
use chrono::Utc;
use tracing::warn;

use crate::analytics::ClickRecorder;
use crate::api::services::{AppStartTime, api_v1_routes, health_routes, redirect_routes};
use crate::config::get_config;
use crate::services::{AnalyticsService, GeoIpProvider, QuotaLedger, Resolver};
use crate::storage::StorageFactory;

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    // 记录程序启动时间
    let app_start_time = AppStartTime {
        start_datetime: Utc::now(),
    };

    let config = get_config();

    let storage = StorageFactory::create().await.map_err(|e| {
        tracing::error!("Storage initialization failed: {}", e);
        anyhow::anyhow!(e)
    })?;

    // 点击记录管线：缓冲 + 定时/阈值刷盘
    let recorder = Arc::new(ClickRecorder::new(
        storage.as_event_sink(),
        Duration::from_secs(config.analytics.flush_interval_secs),
        config.analytics.flush_threshold,
    ));

    let flush_recorder = Arc::clone(&recorder);
    tokio::spawn(async move {
        flush_recorder.start_background_task().await;
    });

    // 过期链接后台清理
    let sweep_storage = Arc::clone(&storage);
    let sweep_interval = Duration::from_secs(config.analytics.expiry_sweep_interval_secs);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(sweep_interval).await;
            if let Err(e) = sweep_storage.purge_expired_links(Utc::now()).await {
                warn!("Expiry sweep failed: {}", e);
            }
        }
    });

    let resolver = web::Data::new(Resolver::new(Arc::clone(&storage)));
    let analytics_service = web::Data::new(AnalyticsService::new(Arc::clone(&storage)));
    let quota_ledger = web::Data::new(QuotaLedger::new(Arc::clone(&storage)));

    // GeoIP 初始化一次，未配置时查询为 no-op
    let geoip = Arc::new(GeoIpProvider::new(&config.analytics));

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let cpu_count = config.server.cpu_count.min(32);
    warn!("Starting server at http://{}", bind_address);

    let storage_data = web::Data::new(Arc::clone(&storage));
    let recorder_data = web::Data::new(Arc::clone(&recorder));
    let geoip_data = web::Data::new(Arc::clone(&geoip));
    let app_start_data = web::Data::new(app_start_time);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .app_data(storage_data.clone())
            .app_data(resolver.clone())
            .app_data(analytics_service.clone())
            .app_data(quota_ledger.clone())
            .app_data(recorder_data.clone())
            .app_data(geoip_data.clone())
            .app_data(app_start_data.clone())
            .service(web::scope("/api/v1").service(api_v1_routes()))
            .service(web::scope("/health").service(health_routes()))
            // 重定向 catch-all 必须挂在最后
            .service(redirect_routes())
    })
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_millis(5000))
    .workers(cpu_count)
    .bind(&bind_address)?
    .run();

    server.await?;

    // 优雅退出：把缓冲区里最后一批点击写完
    warn!("Server stopped, flushing pending clicks");
    recorder.flush().await;

    Ok(())
}
