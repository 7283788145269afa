//! 统一错误处理模块
//!
//! 定义基础设施层共享的错误类型，使用 thiserror 提供良好的错误信息。

use thiserror::Error;

/// 平台基础设施错误类型
#[derive(Debug, Error)]
pub enum PlatformError {
    // ==================== 数据库错误 ====================
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("数据库迁移失败: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // ==================== Kafka 错误 ====================
    #[error("Kafka 错误: {0}")]
    Kafka(String),

    // ==================== 配置错误 ====================
    #[error("配置错误: {0}")]
    Config(#[from] config::ConfigError),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, PlatformError>;

impl PlatformError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Database(_) => "DATABASE_ERROR",
            Self::Migration(_) => "MIGRATION_ERROR",
            Self::Kafka(_) => "KAFKA_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// 转换为 gRPC 状态码
    ///
    /// 基础设施错误对调用方都是内部错误
    pub fn to_grpc_status(&self) -> tonic::Status {
        tonic::Status::internal(self.to_string())
    }
}

impl From<PlatformError> for tonic::Status {
    fn from(err: PlatformError) -> Self {
        err.to_grpc_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            PlatformError::Database(sqlx::Error::PoolTimedOut).code(),
            "DATABASE_ERROR"
        );
        assert_eq!(PlatformError::Kafka("down".to_string()).code(), "KAFKA_ERROR");
    }

    #[test]
    fn test_grpc_status_mapping() {
        let kafka_err = PlatformError::Kafka("down".to_string());
        assert_eq!(kafka_err.to_grpc_status().code(), tonic::Code::Internal);

        let db_err = PlatformError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(tonic::Status::from(db_err).code(), tonic::Code::Internal);
    }
}
