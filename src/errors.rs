use std::fmt;

#[derive(Debug, Clone)]
pub enum ShortspaceError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Validation(String),
    NotFound(String),
    Recording(String),
    AnalyticsQueryFailed(String),
    AnalyticsInvalidDateRange(String),
}

impl ShortspaceError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ShortspaceError::DatabaseConfig(_) => "E001",
            ShortspaceError::DatabaseConnection(_) => "E002",
            ShortspaceError::DatabaseOperation(_) => "E003",
            ShortspaceError::Validation(_) => "E004",
            ShortspaceError::NotFound(_) => "E005",
            ShortspaceError::Recording(_) => "E006",
            ShortspaceError::AnalyticsQueryFailed(_) => "E007",
            ShortspaceError::AnalyticsInvalidDateRange(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ShortspaceError::DatabaseConfig(_) => "Database Configuration Error",
            ShortspaceError::DatabaseConnection(_) => "Database Connection Error",
            ShortspaceError::DatabaseOperation(_) => "Database Operation Error",
            ShortspaceError::Validation(_) => "Validation Error",
            ShortspaceError::NotFound(_) => "Resource Not Found",
            ShortspaceError::Recording(_) => "Click Recording Error",
            ShortspaceError::AnalyticsQueryFailed(_) => "Analytics Query Failed",
            ShortspaceError::AnalyticsInvalidDateRange(_) => "Invalid Analytics Date Range",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ShortspaceError::DatabaseConfig(msg) => msg,
            ShortspaceError::DatabaseConnection(msg) => msg,
            ShortspaceError::DatabaseOperation(msg) => msg,
            ShortspaceError::Validation(msg) => msg,
            ShortspaceError::NotFound(msg) => msg,
            ShortspaceError::Recording(msg) => msg,
            ShortspaceError::AnalyticsQueryFailed(msg) => msg,
            ShortspaceError::AnalyticsInvalidDateRange(msg) => msg,
        }
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ShortspaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ShortspaceError {}

// 便捷的构造函数
impl ShortspaceError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        ShortspaceError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        ShortspaceError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        ShortspaceError::DatabaseOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ShortspaceError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ShortspaceError::NotFound(msg.into())
    }

    pub fn recording<T: Into<String>>(msg: T) -> Self {
        ShortspaceError::Recording(msg.into())
    }

    pub fn analytics_query_failed<T: Into<String>>(msg: T) -> Self {
        ShortspaceError::AnalyticsQueryFailed(msg.into())
    }

    pub fn analytics_invalid_date_range<T: Into<String>>(msg: T) -> Self {
        ShortspaceError::AnalyticsInvalidDateRange(msg.into())
    }
}

impl From<sea_orm::DbErr> for ShortspaceError {
    fn from(err: sea_orm::DbErr) -> Self {
        ShortspaceError::DatabaseOperation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShortspaceError>;
