//! GeoIP 服务
//!
//! 基于本地 MaxMind GeoLite2-City 数据库的 IP 地理位置查询。
//! 未配置数据库或未开启 geo lookup 时查询直接返回 None。

use std::net::IpAddr;
use std::sync::Arc;

use maxminddb::Reader;
use tracing::{info, trace, warn};

use crate::analytics::GeoInfo;
use crate::config::AnalyticsConfig;
use crate::utils::ip::is_private_or_local;

pub struct GeoIpProvider {
    reader: Option<Arc<Reader<Vec<u8>>>>,
}

impl GeoIpProvider {
    /// 根据 AnalyticsConfig 初始化；数据库加载失败时降级为禁用
    pub fn new(config: &AnalyticsConfig) -> Self {
        if !config.enable_geo_lookup {
            return Self { reader: None };
        }

        let reader = match &config.maxminddb_path {
            Some(path) => match Reader::open_readfile(path) {
                Ok(reader) => {
                    info!("GeoIP: Using MaxMind database at {}", path);
                    Some(Arc::new(reader))
                }
                Err(e) => {
                    warn!(
                        "GeoIP: Failed to load MaxMind database at {}: {}, geo lookup disabled",
                        path, e
                    );
                    None
                }
            },
            None => {
                warn!("GeoIP: enable_geo_lookup is set but maxminddb_path is not configured");
                None
            }
        };

        Self { reader }
    }

    pub fn is_enabled(&self) -> bool {
        self.reader.is_some()
    }

    /// 查询 IP 地址的地理位置；私有/本地 IP 直接跳过
    pub fn lookup(&self, ip: &str) -> Option<GeoInfo> {
        let reader = self.reader.as_ref()?;
        let ip_addr: IpAddr = ip.parse().ok()?;
        if is_private_or_local(&ip_addr) {
            return None;
        }

        let result = reader.lookup(ip_addr).ok()?;
        let city: maxminddb::geoip2::City = result.decode().ok()??;

        let country = city.country.iso_code.map(String::from);
        let city_name = city.city.names.english.map(|s| s.to_string());

        trace!(
            "MaxMind lookup for {}: country={:?}, city={:?}",
            ip, country, city_name
        );

        Some(GeoInfo {
            country,
            // GeoLite2-City 的 region 粒度不稳定，这里只取国家和城市
            region: None,
            city: city_name,
        })
    }
}
