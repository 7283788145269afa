//! 仓储 Trait 定义
//!
//! 消费者与 gRPC 层依赖该抽象而非具体实现，便于 mock 测试

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{NewNotification, Notification, UserRecord};

/// 通知仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepositoryTrait: Send + Sync {
    /// 创建一条通知，返回新记录 ID
    async fn create_notification(&self, notification: &NewNotification) -> Result<i64>;

    /// 按创建时间倒序分页查询用户的通知
    async fn get_user_notifications(
        &self,
        username: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>>;

    /// 按创建时间倒序分页查询用户的未读通知
    async fn get_unseen_notifications(
        &self,
        username: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>>;

    /// 将属于该用户的未读通知标记为已读，返回实际发生变化的行数
    async fn mark_notifications_as_seen(
        &self,
        notification_ids: &[i64],
        username: &str,
    ) -> Result<u64>;

    /// 按用户名查询用户资料
    async fn check_if_username_exist(&self, username: &str) -> Result<UserRecord>;
}
