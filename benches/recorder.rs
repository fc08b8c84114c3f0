//! ClickRecorder 性能基准测试

use criterion::{Criterion, criterion_group, criterion_main};
use std::sync::Arc;
use tokio::time::Duration;

use shortspace::analytics::{ClickContext, ClickRecord, ClickRecorder, EventSink};

/// 空 sink，只用于测试 record 性能
struct NoopSink;

#[async_trait::async_trait]
impl EventSink for NoopSink {
    async fn persist_clicks(&self, _records: Vec<ClickRecord>) -> anyhow::Result<()> {
        Ok(())
    }
}

fn create_recorder() -> ClickRecorder {
    ClickRecorder::new(
        Arc::new(NoopSink) as Arc<dyn EventSink>,
        Duration::from_secs(3600), // 长间隔，避免自动刷盘
        usize::MAX,                // 高阈值，避免阈值刷盘
    )
}

/// 单线程 record 吞吐量（含指纹哈希）
fn bench_record_with_fingerprint(c: &mut Criterion) {
    let recorder = create_recorder();

    c.bench_function("record/with_fingerprint", |b| {
        b.iter(|| {
            recorder.record(
                "bench_link",
                ClickContext {
                    ip: Some("203.0.113.9".to_string()),
                    ..Default::default()
                },
            );
        });
    });
}

/// 无指纹的匿名点击
fn bench_record_anonymous(c: &mut Criterion) {
    let recorder = create_recorder();

    c.bench_function("record/anonymous", |b| {
        b.iter(|| {
            recorder.record("bench_link", ClickContext::default());
        });
    });
}

/// drain + restore 周期
fn bench_flush_cycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let recorder = create_recorder();

    c.bench_function("flush/1000_buffered", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                recorder.record("bench_link", ClickContext::default());
            }
            rt.block_on(recorder.flush());
        });
    });
}

criterion_group!(
    benches,
    bench_record_with_fingerprint,
    bench_record_anonymous,
    bench_flush_cycle
);
criterion_main!(benches);
