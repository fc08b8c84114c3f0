//! 点击记录器
//!
//! 负责收集点击事件并刷盘到存储后端，支持：
//! - 高并发写入（DashMap 缓冲区，单调 id 保持插入顺序）
//! - 定时刷盘 + 阈值触发刷盘
//! - 刷盘失败时恢复缓冲区，不丢点击
//!
//! 记录调用永不阻塞重定向响应：record() 只做一次哈希和一次缓冲区插入。

use dashmap::DashMap;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};
use tracing::{debug, trace, warn};

use crate::analytics::{ClickContext, ClickRecord, EventSink};

/// 点击缓冲区状态，封装所有可变状态
struct EventBuffer {
    /// 以单调递增 id 为 key，drain 时按 id 排序恢复插入顺序
    data: DashMap<u64, ClickRecord>,
    next_id: AtomicU64,
    /// 刷盘锁，防止并发刷盘
    flush_lock: Mutex<()>,
    /// 是否有 flush 任务待处理（防止重复 spawn）
    flush_pending: AtomicBool,
}

impl EventBuffer {
    fn new() -> Self {
        Self {
            data: DashMap::new(),
            next_id: AtomicU64::new(0),
            flush_lock: Mutex::new(()),
            flush_pending: AtomicBool::new(false),
        }
    }

    fn push(&self, record: ClickRecord) -> usize {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.data.insert(id, record);
        self.data.len()
    }

    /// 收集所有事件并清空缓冲区（逐个 remove 避免竞态）
    fn drain(&self) -> Vec<ClickRecord> {
        let mut keys: Vec<u64> = self.data.iter().map(|r| *r.key()).collect();
        keys.sort_unstable();

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some((_, record)) = self.data.remove(&key) {
                records.push(record);
            }
        }
        records
    }

    /// 恢复数据到缓冲区（用于刷盘失败时的恢复）
    fn restore(&self, records: Vec<ClickRecord>) {
        for record in records {
            self.push(record);
        }
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

/// 点击记录器
///
/// 状态完全封装在结构体内部，便于测试和多实例使用。
#[derive(Clone)]
pub struct ClickRecorder {
    buffer: Arc<EventBuffer>,
    sink: Arc<dyn EventSink>,
    flush_interval: Duration,
    /// 触发刷盘的缓冲事件数
    max_pending_before_flush: usize,
}

impl ClickRecorder {
    pub fn new(
        sink: Arc<dyn EventSink>,
        flush_interval: Duration,
        max_pending_before_flush: usize,
    ) -> Self {
        Self {
            buffer: Arc::new(EventBuffer::new()),
            sink,
            flush_interval,
            max_pending_before_flush,
        }
    }

    /// 记录一次点击（线程安全，无锁，不等待存储）
    ///
    /// IP 在此处立即转为指纹，原始 IP 不进入缓冲区。
    pub fn record(&self, link_id: &str, context: ClickContext) -> ClickRecord {
        let record = ClickRecord::new(link_id, context);
        let pending = self.buffer.push(record.clone());
        trace!("ClickRecorder: buffered click, pending={}", pending);

        // 检查是否达到阈值，尝试触发刷盘
        if pending >= self.max_pending_before_flush {
            // 使用 compare_exchange 防止任务风暴：
            // 只有成功将 flush_pending 从 false 设为 true 的线程才 spawn
            if self
                .buffer
                .flush_pending
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                let buffer = Arc::clone(&self.buffer);
                let sink = Arc::clone(&self.sink);
                tokio::spawn(async move {
                    if let Ok(_guard) = buffer.flush_lock.try_lock() {
                        Self::flush_buffer(&buffer, &sink).await;
                    } else {
                        trace!("ClickRecorder: flush already in progress, skipping");
                    }
                    // 无论成功与否都重置标志，允许下次触发
                    buffer.flush_pending.store(false, Ordering::Release);
                });
            }
        }

        record
    }

    /// 启动后台刷盘任务（作为异步方法运行）
    pub async fn start_background_task(&self) {
        loop {
            sleep(self.flush_interval).await;

            debug!("ClickRecorder: Triggering scheduled flush");
            if let Ok(_guard) = self.buffer.flush_lock.try_lock() {
                Self::flush_buffer(&self.buffer, &self.sink).await;
            } else {
                trace!("ClickRecorder: flush already in progress, skipping scheduled flush");
            }
        }
    }

    /// 手动触发刷盘（阻塞直到完成）
    pub async fn flush(&self) {
        debug!("ClickRecorder: Manual flush triggered");
        let _guard = self.buffer.flush_lock.lock().await;
        Self::flush_buffer(&self.buffer, &self.sink).await;
    }

    /// 执行实际的刷盘操作
    async fn flush_buffer(buffer: &EventBuffer, sink: &Arc<dyn EventSink>) {
        let records = buffer.drain();

        if records.is_empty() {
            trace!("ClickRecorder: No clicks to flush");
            return;
        }

        let count = records.len();
        match sink.persist_clicks(records.clone()).await {
            Ok(_) => {
                debug!("ClickRecorder: Successfully flushed {} events", count);
            }
            Err(e) => {
                // 刷盘失败，恢复数据到 buffer；失败对客户端不可见
                buffer.restore(records);
                warn!(
                    "ClickRecorder: persist_clicks failed: {}, {} events restored to buffer",
                    e, count
                );
            }
        }
    }

    /// 当前缓冲区大小（用于监控）
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}
