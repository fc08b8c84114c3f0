//! Analytics service layer
//!
//! Computes organization-level snapshots over stored click events. The
//! aggregation itself is a pure function over the fetched rows; denormalized
//! link counters are never consulted, so drift in those caches cannot corrupt
//! analytics output.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::ShortspaceError;
use crate::storage::SeaOrmStorage;
use crate::storage::backend::OrgClickRow;

/// 时间线最多回溯的天数
pub const TIMELINE_MAX_DAYS: usize = 60;
const TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub clicks: u64,
    pub unique_visitors: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopItem {
    pub label: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopLinkItem {
    pub link_id: String,
    pub slug: String,
    pub destination_url: String,
    pub value: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSnapshot {
    pub total_clicks: u64,
    pub unique_visitors: u64,
    pub timeline: Vec<SeriesPoint>,
    pub top_links: Vec<TopLinkItem>,
    pub top_referrers: Vec<TopItem>,
    pub top_countries: Vec<TopItem>,
}

/// referrer → 展示标签
///
/// 取 referrer URL 的主机名；缺失或无法解析的一律归入 "Direct"。
pub fn referrer_label(referrer: Option<&str>) -> String {
    referrer
        .and_then(|raw| {
            url::Url::parse(raw)
                .ok()
                .and_then(|u| u.host_str().map(String::from))
        })
        .unwrap_or_else(|| "Direct".to_string())
}

/// 保持首次出现顺序的计数器
///
/// 稳定排序后同分项保持插入顺序，保证相同输入得到相同输出。
struct OrderedCounter {
    index: HashMap<String, usize>,
    items: Vec<(String, u64)>,
}

impl OrderedCounter {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            items: Vec::new(),
        }
    }

    fn bump(&mut self, label: &str) {
        match self.index.get(label) {
            Some(&i) => self.items[i].1 += 1,
            None => {
                self.index.insert(label.to_string(), self.items.len());
                self.items.push((label.to_string(), 1));
            }
        }
    }

    fn top(mut self, n: usize) -> Vec<TopItem> {
        self.items.sort_by(|a, b| b.1.cmp(&a.1));
        self.items
            .into_iter()
            .take(n)
            .map(|(label, value)| TopItem { label, value })
            .collect()
    }
}

/// 对取出的事件做纯聚合
pub fn aggregate_snapshot(
    events: &[OrgClickRow],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> AnalyticsSnapshot {
    let total_clicks = events.len() as u64;

    let mut visitors: HashSet<String> = HashSet::new();
    let mut referrers = OrderedCounter::new();
    let mut countries = OrderedCounter::new();
    let mut link_index: HashMap<String, usize> = HashMap::new();
    let mut link_items: Vec<TopLinkItem> = Vec::new();
    let mut clicks_by_day: HashMap<NaiveDate, u64> = HashMap::new();
    let mut uniques_by_day: HashMap<NaiveDate, HashSet<String>> = HashMap::new();

    for event in events {
        // 无指纹的事件以自身事件 id 作为访客 key，与记录侧的多计策略一致
        let visitor_key = event
            .ip_hash
            .clone()
            .unwrap_or_else(|| format!("event:{}", event.id));
        visitors.insert(visitor_key.clone());

        referrers.bump(&referrer_label(event.referrer.as_deref()));
        countries.bump(
            event
                .country
                .as_deref()
                .filter(|c| !c.is_empty())
                .unwrap_or("Unknown"),
        );

        match link_index.get(&event.link_id) {
            Some(&i) => link_items[i].value += 1,
            None => {
                link_index.insert(event.link_id.clone(), link_items.len());
                link_items.push(TopLinkItem {
                    link_id: event.link_id.clone(),
                    slug: event.link_slug.clone(),
                    destination_url: event.link_destination.clone(),
                    value: 1,
                });
            }
        }

        let day = event.occurred_at.date_naive();
        *clicks_by_day.entry(day).or_insert(0) += 1;
        uniques_by_day.entry(day).or_default().insert(visitor_key);
    }

    // 时间线：[from, to] 内每个自然日一条，范围超过上限时保留最近 60 天
    let from_day = from.date_naive();
    let to_day = to.date_naive();
    let total_days = ((to_day - from_day).num_days().max(0) as usize) + 1;
    let keep = total_days.min(TIMELINE_MAX_DAYS);
    let timeline: Vec<SeriesPoint> = from_day
        .iter_days()
        .take(total_days)
        .skip(total_days - keep)
        .map(|day| SeriesPoint {
            date: day,
            clicks: clicks_by_day.get(&day).copied().unwrap_or(0),
            unique_visitors: uniques_by_day.get(&day).map(|s| s.len() as u64).unwrap_or(0),
        })
        .collect();

    link_items.sort_by(|a, b| b.value.cmp(&a.value));
    link_items.truncate(TOP_N);

    AnalyticsSnapshot {
        total_clicks,
        unique_visitors: visitors.len() as u64,
        timeline,
        top_links: link_items,
        top_referrers: referrers.top(TOP_N),
        top_countries: countries.top(TOP_N),
    }
}

/// Analytics 服务
pub struct AnalyticsService {
    storage: Arc<SeaOrmStorage>,
}

impl AnalyticsService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 严格解析日期范围，解析失败时返回错误
    ///
    /// 支持 RFC3339 和 YYYY-MM-DD 格式；两端必须同时给出或同时省略。
    pub fn parse_date_range_strict(
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), ShortspaceError> {
        match (start_date, end_date) {
            (Some(s), Some(e)) => {
                let start = Self::parse_date(s).ok_or_else(|| {
                    ShortspaceError::analytics_invalid_date_range(format!(
                        "Invalid start date format: '{}'. Supported formats: RFC3339 or YYYY-MM-DD",
                        s
                    ))
                })?;
                let end = Self::parse_date(e).ok_or_else(|| {
                    ShortspaceError::analytics_invalid_date_range(format!(
                        "Invalid end date format: '{}'. Supported formats: RFC3339 or YYYY-MM-DD",
                        e
                    ))
                })?;
                if start > end {
                    return Err(ShortspaceError::analytics_invalid_date_range(
                        "Start date must not be later than end date",
                    ));
                }
                Ok((start, end))
            }
            (Some(_), None) => Err(ShortspaceError::analytics_invalid_date_range(
                "Start date is provided but end date is missing",
            )),
            (None, Some(_)) => Err(ShortspaceError::analytics_invalid_date_range(
                "End date is provided but start date is missing",
            )),
            (None, None) => Ok(Self::default_date_range()),
        }
    }

    fn parse_date(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| {
                chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc())
            })
    }

    fn default_date_range() -> (DateTime<Utc>, DateTime<Utc>) {
        let end = Utc::now();
        let start = end - Duration::days(30);
        (start, end)
    }

    /// 计算组织在 [from, to] 范围内的分析快照
    pub async fn snapshot(
        &self,
        organization_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<AnalyticsSnapshot, ShortspaceError> {
        info!(
            "Analytics: snapshot for '{}' from {} to {}",
            organization_id, from, to
        );

        let events = self
            .storage
            .fetch_org_clicks(organization_id, from, to)
            .await
            .map_err(|e| {
                ShortspaceError::analytics_query_failed(format!("Snapshot query failed: {}", e))
            })?;

        let snapshot = aggregate_snapshot(&events, from, to);

        debug!(
            "Analytics: snapshot for '{}' covers {} events, {} timeline days",
            organization_id,
            snapshot.total_clicks,
            snapshot.timeline.len()
        );

        Ok(snapshot)
    }
}
