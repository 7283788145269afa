//! 通知服务错误类型
//!
//! 区分"引用无法解析"、"存储故障"、"消息无法解码"、"接口未实现"等场景，
//! 消费者据此记录日志后丢弃，gRPC 层据此映射状态码。

use thiserror::Error;
use tonic::Status;

use notification_shared::error::PlatformError;

#[derive(Debug, Error)]
pub enum NotificationError {
    /// 用户名、账户 ID、通知类型、渠道或博客无法解析为内部主键
    #[error("记录未找到: {entity} {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("事件解码失败: {0}")]
    Decode(String),

    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("接口未实现: {0}")]
    Unimplemented(&'static str),

    #[error(transparent)]
    Shared(#[from] PlatformError),
}

pub type Result<T> = std::result::Result<T, NotificationError>;

impl NotificationError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// 获取错误码（用于日志与指标）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unimplemented(_) => "UNIMPLEMENTED",
            Self::Shared(e) => e.code(),
        }
    }
}

impl From<NotificationError> for Status {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::NotFound { .. } => Status::not_found(err.to_string()),
            NotificationError::Validation(_) => Status::invalid_argument(err.to_string()),
            NotificationError::Decode(_) => Status::invalid_argument(err.to_string()),
            NotificationError::Unimplemented(_) => Status::unimplemented(err.to_string()),
            NotificationError::Database(_) => Status::internal(err.to_string()),
            NotificationError::Shared(e) => e.to_grpc_status(),
        }
    }
}
