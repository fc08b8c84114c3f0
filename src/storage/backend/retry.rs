//! 数据库操作重试模块
//!
//! 对暂时性数据库错误（死锁、锁超时、连接获取失败）做指数退避重试。

use sea_orm::DbErr;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// 判断数据库错误是否可重试
pub fn is_retryable_error(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | // 连接池获取失败
        DbErr::Conn(_) => true, // 连接问题
        DbErr::Exec(runtime_err) | DbErr::Query(runtime_err) => {
            is_retryable_runtime_error(runtime_err)
        }
        _ => false,
    }
}

/// 判断运行时错误是否可重试（死锁、锁超时等）
fn is_retryable_runtime_error(err: &sea_orm::error::RuntimeErr) -> bool {
    use sea_orm::error::RuntimeErr;

    match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            use std::ops::Deref;
            if let Some(db_err) = sqlx_err.deref().as_database_error() {
                // 通过错误码识别可重试错误
                if let Some(code) = db_err.code() {
                    let code_str = code.as_ref();
                    return matches!(
                        code_str,
                        // MySQL 死锁和锁超时
                        "1213" | "1205" |
                        // PostgreSQL 序列化失败和死锁
                        "40001" | "40P01" |
                        // SQLite BUSY 和 LOCKED
                        "5" | "6"
                    );
                }
            }
            // 回退到字符串匹配（用于非 Database 错误）
            let err_str = sqlx_err.to_string().to_lowercase();
            is_retryable_error_message(&err_str)
        }
        RuntimeErr::Internal(msg) => {
            let err_str = msg.to_lowercase();
            is_retryable_error_message(&err_str)
        }
        #[allow(unreachable_patterns)]
        _ => false,
    }
}

/// 通过错误消息判断是否可重试（回退方案）
fn is_retryable_error_message(err_str: &str) -> bool {
    err_str.contains("deadlock")
        || err_str.contains("lock wait timeout")
        || err_str.contains("database is locked")
        || err_str.contains("serialization failure")
}

/// 重试配置
#[derive(Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// 指数退避重试执行器
///
/// 对可重试错误自动进行重试，使用指数退避 + 随机抖动避免惊群效应
pub async fn with_retry<T, F, Fut>(
    operation_name: &str,
    config: RetryConfig,
    mut operation: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(
                        "Operation '{}' succeeded after {} retries",
                        operation_name, attempt
                    );
                }
                return Ok(result);
            }
            Err(e) if is_retryable_error(&e) && attempt < config.max_retries => {
                attempt += 1;
                let delay = calculate_backoff(attempt, config.base_delay_ms, config.max_delay_ms);
                warn!(
                    "Operation '{}' failed (attempt {}/{}): {}; retrying in {} ms",
                    operation_name,
                    attempt,
                    config.max_retries + 1,
                    e,
                    delay
                );
                sleep(Duration::from_millis(delay)).await;
            }
            Err(e) => {
                if !is_retryable_error(&e) {
                    debug!(
                        "Operation '{}' failed with non-retryable error: {}",
                        operation_name, e
                    );
                }
                return Err(e);
            }
        }
    }
}

/// 计算指数退避延迟（带抖动）
fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> u64 {
    use rand::RngExt;
    let exp_delay = base_ms.saturating_mul(2u64.saturating_pow(attempt - 1));
    let capped = exp_delay.min(max_ms);
    // 添加 0-25% 的随机抖动，避免惊群效应
    let jitter = rand::rng().random_range(0..=capped / 4);
    capped.saturating_add(jitter)
}
