//! 客户端 IP 提取工具
//!
//! 从代理转发头中提取真实客户端 IP，优先级：
//! - X-Forwarded-For（取第一个条目，即原始客户端）
//! - X-Real-IP
//! - CF-Connecting-IP

use std::net::IpAddr;

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;

/// 检查 IP 是否为私有地址或 localhost
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
        IpAddr::V6(v6) => {
            // IPv6 私有地址：
            // - fc00::/7 (ULA, RFC 4193)
            // - fe80::/10 (Link-local)
            // - ::1 (Loopback)
            v6.is_loopback()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// 从 HttpRequest 提取客户端 IP
pub fn extract_client_ip(req: &HttpRequest) -> Option<String> {
    extract_forwarded_ip_from_headers(req.headers())
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
}

/// 从 HeaderMap 提取转发的 IP
pub fn extract_forwarded_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    // 优先 X-Forwarded-For（取第一个，即原始客户端 IP）
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .or_else(|| {
            // 其次 X-Real-IP
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .or_else(|| {
            // 最后 CF-Connecting-IP（Cloudflare 直连场景）
            headers
                .get("cf-connecting-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
}
