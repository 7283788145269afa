//! 通知服务
//!
//! 消费用户行为事件生成站内通知，并通过 gRPC 提供通知查询与已读标记。
//!
//! ## 核心功能
//!
//! - **事件消费**：从 Kafka 拉取用户注册、博客点赞、用户关注事件，按行为类型生成通知
//! - **通知持久化**：将外部账户 ID、用户名、类型名、渠道名解析为内部主键后落库
//! - **通知查询**：按创建时间倒序分页查询，支持流式返回
//! - **已读标记**：批量将属于该用户的未读通知标记为已读
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `repository`: 数据库仓储层
//! - `processor`: 行为事件分发
//! - `consumer`: Kafka 消费循环
//! - `grpc`: gRPC 服务端实现

pub mod consumer;
pub mod error;
pub mod grpc;
pub mod models;
pub mod processor;
pub mod repository;

pub use consumer::ActionConsumer;
pub use error::{NotificationError, Result};
pub use grpc::NotificationServiceImpl;
pub use models::*;
pub use processor::{ActionDispatcher, DispatchOutcome};
pub use repository::{NotificationRepository, NotificationRepositoryTrait};
