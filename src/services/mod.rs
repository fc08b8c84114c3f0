pub mod analytics_service;
pub mod geoip;
pub mod quota;
pub mod resolver;

pub use analytics_service::{AnalyticsService, AnalyticsSnapshot};
pub use geoip::GeoIpProvider;
pub use quota::{PlanLimits, QuotaLedger};
pub use resolver::Resolver;
