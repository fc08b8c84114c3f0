pub mod recorder;
pub mod sink;

pub use recorder::ClickRecorder;
pub use sink::{EventSink, StdoutSink};

use chrono::{DateTime, Utc};

use crate::utils::fingerprint::visitor_fingerprint;

/// 地理位置信息（尽力而为，全部可空）
#[derive(Debug, Clone, Default)]
pub struct GeoInfo {
    /// ISO 3166-1 alpha-2 国家代码
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
}

/// UTM campaign parameters extracted from the inbound query string.
#[derive(Debug, Clone, Default)]
pub struct UtmParams {
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
    pub term: Option<String>,
    pub content: Option<String>,
}

impl UtmParams {
    pub fn is_empty(&self) -> bool {
        self.source.is_none()
            && self.medium.is_none()
            && self.campaign.is_none()
            && self.term.is_none()
            && self.content.is_none()
    }
}

/// Request-side context for one click, as extracted by the redirect handler.
#[derive(Debug, Clone, Default)]
pub struct ClickContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub geo: Option<GeoInfo>,
    pub utm: Option<UtmParams>,
}

/// One buffered click, ready for persistence.
///
/// The raw IP is hashed into `fingerprint` at construction time and never
/// stored anywhere beyond the request handler.
#[derive(Debug, Clone)]
pub struct ClickRecord {
    pub link_id: String,
    pub occurred_at: DateTime<Utc>,
    pub fingerprint: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
}

impl ClickRecord {
    pub fn new(link_id: &str, context: ClickContext) -> Self {
        let geo = context.geo.unwrap_or_default();
        let utm = context.utm.unwrap_or_default();
        Self {
            link_id: link_id.to_string(),
            occurred_at: Utc::now(),
            fingerprint: context.ip.as_deref().map(visitor_fingerprint),
            referrer: context.referrer,
            user_agent: context.user_agent,
            country: geo.country,
            region: geo.region,
            city: geo.city,
            utm_source: utm.source,
            utm_medium: utm.medium,
            utm_campaign: utm.campaign,
            utm_term: utm.term,
            utm_content: utm.content,
        }
    }
}
