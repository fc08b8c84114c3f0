use super::ClickRecord;

/// 点击事件持久化 Sink
///
/// 一个批次内要完成：事件落库、链接计数器更新、unique visitor 判定。
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    async fn persist_clicks(&self, records: Vec<ClickRecord>) -> anyhow::Result<()>;
}

pub struct StdoutSink;

#[async_trait::async_trait]
impl EventSink for StdoutSink {
    async fn persist_clicks(&self, records: Vec<ClickRecord>) -> anyhow::Result<()> {
        println!("Persisting clicks: {} records", records.len());
        for record in &records {
            println!("  - {:?}", record);
        }
        Ok(())
    }
}
