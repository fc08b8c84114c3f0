//! Redirect endpoint
//!
//! The one component with direct external I/O. Per request: decode path
//! segments, check the reserved-slug table, resolve through the strategy
//! chain, answer immediately, and hand the click to the recorder without
//! waiting on storage. HEAD requests resolve and redirect but never record;
//! they are used for link-health probing and must not pollute analytics.

use std::sync::Arc;

use actix_web::http::{Method, StatusCode};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::{error, trace};

use crate::analytics::{ClickContext, ClickRecorder, UtmParams};
use crate::services::{GeoIpProvider, Resolver};
use crate::storage::ResolvedLink;
use crate::utils::decode_segment;
use crate::utils::ip::extract_client_ip;

/// 保留 slug 的静态跳转表（仅在无显式域名段时生效）
static STATIC_REDIRECTS: &[(&str, &str)] = &[
    ("source", "https://github.com/shortspace/shortspace"),
    ("docs", "https://shortspace.dev/docs"),
];

pub struct RedirectService {}

impl RedirectService {
    pub async fn handle_redirect(
        req: HttpRequest,
        path: web::Path<String>,
        resolver: web::Data<Resolver>,
        recorder: web::Data<Arc<ClickRecorder>>,
        geoip: web::Data<Arc<GeoIpProvider>>,
    ) -> impl Responder {
        let captured_path = path.into_inner();

        // 空路径或多于两段的路径直接 404，不发起任何查询
        let segments: Vec<&str> = captured_path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() || segments.len() > 2 {
            return Self::not_found_response();
        }

        // 两段形式 /{domain}/{slug}，一段形式 /{slug}
        let (raw_domain, raw_slug) = if segments.len() == 2 {
            (Some(segments[0]), segments[1])
        } else {
            (None, segments[0])
        };

        // 百分号解码失败按 404 处理，不泄露解析细节
        let slug = match decode_segment(raw_slug) {
            Some(s) => s.into_owned(),
            None => return Self::not_found_response(),
        };
        let path_domain = match raw_domain {
            Some(raw) => match decode_segment(raw) {
                Some(d) => Some(d.into_owned()),
                None => return Self::not_found_response(),
            },
            None => None,
        };

        // 保留 slug：带显式域名段时不生效
        if path_domain.is_none()
            && let Some(destination) = Self::static_destination(&slug)
        {
            trace!("Static redirect for reserved slug '{}'", slug);
            return Self::redirect_response(destination);
        }

        let host = Self::extract_request_host(&req);

        match resolver
            .resolve(&slug, path_domain.as_deref(), host.as_deref())
            .await
        {
            Ok(Some(link)) => {
                // HEAD 用于链接健康探测，不产生点击
                if req.method() == Method::GET {
                    Self::dispatch_click(&req, &link, &recorder, &geoip);
                }
                Self::redirect_response(&link.destination_url)
            }
            Ok(None) => Self::not_found_response(),
            Err(e) => {
                // 解析期的存储故障对外统一表现为 404
                error!("Storage error during redirect resolution: {}", e);
                Self::not_found_response()
            }
        }
    }

    fn static_destination(slug: &str) -> Option<&'static str> {
        let lower = slug.to_lowercase();
        STATIC_REDIRECTS
            .iter()
            .find(|(reserved, _)| *reserved == lower)
            .map(|(_, destination)| *destination)
    }

    #[inline]
    fn redirect_response(destination: &str) -> HttpResponse {
        HttpResponse::build(StatusCode::FOUND)
            .insert_header(("Location", destination))
            .insert_header(("Cache-Control", "no-store, max-age=0"))
            .finish()
    }

    #[inline]
    fn not_found_response() -> HttpResponse {
        HttpResponse::build(StatusCode::NOT_FOUND)
            .insert_header(("Cache-Control", "no-store, max-age=0"))
            .finish()
    }

    /// 有效主机名：优先 X-Forwarded-Host，退回 Host；逗号列表取第一个
    fn extract_request_host(req: &HttpRequest) -> Option<String> {
        let header = req
            .headers()
            .get("x-forwarded-host")
            .or_else(|| req.headers().get("host"))?;
        let value = header.to_str().ok()?;
        let primary = value.split(',').next()?.trim();
        if primary.is_empty() {
            None
        } else {
            Some(primary.to_string())
        }
    }

    /// 从 query string 提取 UTM 参数，空白值视为缺失
    fn extract_utm_params(query: &str) -> Option<UtmParams> {
        let mut utm = UtmParams::default();
        for part in query.split('&') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let slot = match key {
                "utm_source" => &mut utm.source,
                "utm_medium" => &mut utm.medium,
                "utm_campaign" => &mut utm.campaign,
                "utm_term" => &mut utm.term,
                "utm_content" => &mut utm.content,
                _ => continue,
            };
            // urlencoding::decode 返回 Cow，未编码时零分配
            if let Ok(decoded) = urlencoding::decode(value) {
                let trimmed = decoded.trim();
                if !trimmed.is_empty() {
                    *slot = Some(trimmed.to_string());
                }
            }
        }

        if utm.is_empty() { None } else { Some(utm) }
    }

    /// 派发点击记录（后台执行，不阻塞已构建的响应）
    #[inline]
    fn dispatch_click(
        req: &HttpRequest,
        link: &ResolvedLink,
        recorder: &web::Data<Arc<ClickRecorder>>,
        geoip: &web::Data<Arc<GeoIpProvider>>,
    ) {
        // 同步阶段：只提取原始字符串
        let link_id = link.id.clone();
        let utm = req.uri().query().and_then(Self::extract_utm_params);
        let referrer = req
            .headers()
            .get("referer")
            .and_then(|h| h.to_str().ok())
            .map(String::from);
        let user_agent = req
            .headers()
            .get("user-agent")
            .and_then(|h| h.to_str().ok())
            .map(String::from);
        let ip = extract_client_ip(req);
        let recorder = Arc::clone(recorder.get_ref());
        let geoip = Arc::clone(geoip.get_ref());

        // 异步阶段：geo 查询和入缓冲区都在后台任务执行
        tokio::spawn(async move {
            let geo = ip.as_deref().and_then(|ip| geoip.lookup(ip));
            recorder.record(
                &link_id,
                ClickContext {
                    ip,
                    user_agent,
                    referrer,
                    geo,
                    utm,
                },
            );
        });
    }
}

/// Redirect 路由配置
pub fn redirect_routes() -> actix_web::Scope {
    use actix_web::web;

    web::scope("")
        .route("/{path:.*}", web::get().to(RedirectService::handle_redirect))
        .route("/{path:.*}", web::head().to(RedirectService::handle_redirect))
}
