//! SeaORM storage backend
//!
//! This module provides database storage using SeaORM,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.

mod analytics;
mod click_store;
mod connection;
mod converters;
mod query;
pub mod retry;

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::warn;

use crate::analytics::EventSink;
use crate::errors::{Result, ShortspaceError};

pub use analytics::OrgClickRow;
pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{model_to_link, model_to_organization, model_to_resolved_link};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(ShortspaceError::database_config(format!(
            "Cannot infer database backend from URL: {}. Supported URL schemes: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    /// 重试配置
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(ShortspaceError::database_config(
                "DATABASE_URL is not set".to_string(),
            ));
        }

        // 读取重试配置
        let config = crate::config::get_config();
        let retry_config = retry::RetryConfig {
            max_retries: config.database.retry_count,
            base_delay_ms: config.database.retry_base_delay_ms,
            max_delay_ms: config.database.retry_max_delay_ms,
        };

        // 根据不同数据库类型配置连接选项
        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, backend_name).await?
        };

        let storage = SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
            retry_config,
        };

        // 运行迁移
        run_migrations(&storage.db).await?;

        warn!(
            "{} Storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    pub fn as_event_sink(self: &Arc<Self>) -> Arc<dyn EventSink> {
        Arc::clone(self) as Arc<dyn EventSink>
    }

    /// 获取数据库连接（用于健康检查等需要直接访问数据库的场景)
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}
