//! Domain/slug resolution
//!
//! Given a decoded slug, an optional explicit path-domain segment and the
//! request host, find the owning link through an ordered chain of independent
//! lookup strategies. Resolution is a pure read: no locks, no side effects.

use std::sync::Arc;

use tracing::debug;

use crate::errors::Result;
use crate::storage::{ResolvedLink, SeaOrmStorage};
use crate::utils::normalize_host_candidate;

/// 单个解析策略，每个策略对应一条独立的仓储查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupStrategy {
    /// 路径段显式声明的自定义域
    PathDomain(String),
    /// 请求 Host 匹配的自定义域
    HostDomain(String),
    /// 请求 Host 匹配组织主域（仅无绑定域的链接）
    PrimaryDomain(String),
    /// 仅按 slug 匹配无绑定域的链接，与 Host 无关
    SlugOnly,
}

impl LookupStrategy {
    /// 构建一次解析的策略链
    ///
    /// 路径里带显式域名声明时只允许该域匹配，不做任何回退——第二个路径段
    /// 就是对域的明确主张，落空即整体失败。
    pub fn chain(path_domain: Option<&str>, request_host: Option<&str>) -> Vec<LookupStrategy> {
        if let Some(domain) = path_domain {
            return vec![LookupStrategy::PathDomain(domain.to_string())];
        }

        let mut chain = Vec::with_capacity(3);
        if let Some(host) = request_host {
            chain.push(LookupStrategy::HostDomain(host.to_string()));
            chain.push(LookupStrategy::PrimaryDomain(host.to_string()));
        }
        chain.push(LookupStrategy::SlugOnly);
        chain
    }

    async fn lookup(&self, storage: &SeaOrmStorage, slug: &str) -> Result<Option<ResolvedLink>> {
        match self {
            LookupStrategy::PathDomain(domain) | LookupStrategy::HostDomain(domain) => {
                storage.find_link_by_custom_domain(domain, slug).await
            }
            LookupStrategy::PrimaryDomain(host) => {
                storage.find_link_by_primary_domain(host, slug).await
            }
            LookupStrategy::SlugOnly => storage.find_link_by_slug_only(slug).await,
        }
    }
}

pub struct Resolver {
    storage: Arc<SeaOrmStorage>,
}

impl Resolver {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 解析 (slug, path_domain, request_host) 到链接
    ///
    /// slug 与主机名都按小写匹配。空 slug 不发起任何查询。
    pub async fn resolve(
        &self,
        slug: &str,
        path_domain: Option<&str>,
        request_host: Option<&str>,
    ) -> Result<Option<ResolvedLink>> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Ok(None);
        }
        let slug_lower = slug.to_lowercase();

        // 显式域名段规范化后为空视为无效主张，直接失败
        let path_domain = match path_domain {
            Some(raw) => match normalize_host_candidate(raw) {
                Some(host) => Some(host),
                None => return Ok(None),
            },
            None => None,
        };
        let request_host = request_host.and_then(normalize_host_candidate);

        for strategy in LookupStrategy::chain(path_domain.as_deref(), request_host.as_deref()) {
            if let Some(link) = strategy.lookup(&self.storage, &slug_lower).await? {
                debug!(
                    "Resolved slug '{}' via {:?} -> link {}",
                    slug_lower, strategy, link.id
                );
                return Ok(Some(link));
            }
        }

        debug!("No link resolved for slug '{}'", slug_lower);
        Ok(None)
    }
}
