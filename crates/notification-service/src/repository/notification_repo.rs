//! 通知仓储
//!
//! 负责通知的增查改以及外部标识到内部主键的解析

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use super::traits::NotificationRepositoryTrait;
use crate::error::{NotificationError, Result};
use crate::models::{
    DELIVERY_STATUS_PENDING, NewNotification, Notification, UserLookupColumn, UserRecord,
};

const LIST_NOTIFICATIONS_SQL: &str = r#"
    SELECT n.id, n.user_id, n.notification_type_id, nt.notification_name, n.message,
           n.related_blog_id, n.related_user_id, n.created_at, n.seen,
           n.delivery_status, nc.channel_name
    FROM notifications n
    JOIN notification_type nt ON n.notification_type_id = nt.id
    JOIN notification_channel nc ON n.channel_id = nc.id
    WHERE n.user_id = $1
    ORDER BY n.created_at DESC, n.id DESC
    LIMIT $2 OFFSET $3
"#;

const LIST_UNSEEN_NOTIFICATIONS_SQL: &str = r#"
    SELECT n.id, n.user_id, n.notification_type_id, nt.notification_name, n.message,
           n.related_blog_id, n.related_user_id, n.created_at, n.seen,
           n.delivery_status, nc.channel_name
    FROM notifications n
    JOIN notification_type nt ON n.notification_type_id = nt.id
    JOIN notification_channel nc ON n.channel_id = nc.id
    WHERE n.user_id = $1 AND n.seen = FALSE
    ORDER BY n.created_at DESC, n.id DESC
    LIMIT $2 OFFSET $3
"#;

/// 通知仓储
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 标识解析 ====================

    /// 按指定列解析用户内部主键
    pub async fn resolve_user_id(&self, column: UserLookupColumn, value: &str) -> Result<i64> {
        let sql = format!("SELECT id FROM user_account WHERE {} = $1", column.column());

        sqlx::query_scalar::<_, i64>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| NotificationError::not_found("user_account", format!("{column}={value}")))
    }

    /// 通知类型名 -> 类型 ID
    pub async fn resolve_notification_type_id(&self, notification_name: &str) -> Result<i32> {
        sqlx::query_scalar::<_, i32>(
            "SELECT id FROM notification_type WHERE notification_name = $1",
        )
        .bind(notification_name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| NotificationError::not_found("notification_type", notification_name))
    }

    /// 渠道名 -> 渠道 ID
    pub async fn resolve_channel_id(&self, channel_name: &str) -> Result<i32> {
        sqlx::query_scalar::<_, i32>("SELECT id FROM notification_channel WHERE channel_name = $1")
            .bind(channel_name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| NotificationError::not_found("notification_channel", channel_name))
    }

    /// 博客外部 ID -> 博客内部主键
    pub async fn resolve_blog_id(&self, blog_id: &str) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM blog WHERE blog_id = $1")
            .bind(blog_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| NotificationError::not_found("blog", blog_id))
    }

    /// 按指定列查询完整用户资料
    pub async fn fetch_user_by(&self, column: UserLookupColumn, value: &str) -> Result<UserRecord> {
        let sql = format!(
            r#"
            SELECT ua.id, ua.account_id, ua.username, ua.first_name, ua.last_name, ua.email,
                   evs.status AS email_verification_status, us.status AS user_status
            FROM user_account ua
            LEFT JOIN user_auth_info uai ON ua.id = uai.user_id
            LEFT JOIN email_validation_status evs ON uai.email_validation_status = evs.id
            LEFT JOIN user_status us ON ua.user_status = us.id
            WHERE ua.{} = $1
            "#,
            column.column()
        );

        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| NotificationError::not_found("user_account", format!("{column}={value}")))
    }

    // ==================== 写入操作 ====================

    /// 创建通知
    ///
    /// 依次解析接收者、类型、渠道、关联用户、关联博客，全部成功后才执行插入。
    /// 相同事件重复投递会产生重复记录。
    #[instrument(skip(self, notification), fields(
        account_id = %notification.account_id,
        notification_type = %notification.notification_type,
    ))]
    pub async fn create_notification(&self, notification: &NewNotification) -> Result<i64> {
        let user_id = self
            .resolve_user_id(UserLookupColumn::AccountId, &notification.account_id)
            .await?;
        let notification_type_id = self
            .resolve_notification_type_id(&notification.notification_type)
            .await?;
        let channel_id = self.resolve_channel_id(&notification.channel).await?;

        let related_user_id = match notification.related_user_account_id.as_deref() {
            Some(account_id) => Some(
                self.resolve_user_id(UserLookupColumn::AccountId, account_id)
                    .await?,
            ),
            None => None,
        };

        let related_blog_id = match notification.related_blog_id.as_deref() {
            Some(blog_id) => Some(self.resolve_blog_id(blog_id).await?),
            None => None,
        };

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO notifications
                (user_id, notification_type_id, message, related_blog_id, related_user_id,
                 channel_id, delivery_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(notification_type_id)
        .bind(&notification.message)
        .bind(related_blog_id)
        .bind(related_user_id)
        .bind(channel_id)
        .bind(DELIVERY_STATUS_PENDING)
        .fetch_one(&self.pool)
        .await?;

        info!(notification_id = id, user_id, "通知已创建");
        Ok(id)
    }

    /// 批量标记已读
    ///
    /// 只更新 ID 在列表中、属于该用户且当前未读的行；其余 ID 静默忽略。
    #[instrument(skip(self, notification_ids), fields(count = notification_ids.len()))]
    pub async fn mark_notifications_as_seen(
        &self,
        notification_ids: &[i64],
        username: &str,
    ) -> Result<u64> {
        let user_id = self
            .resolve_user_id(UserLookupColumn::Username, username)
            .await?;

        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET seen = TRUE
            WHERE id = ANY($1) AND user_id = $2 AND seen = FALSE
            "#,
        )
        .bind(notification_ids)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        let affected = result.rows_affected();
        if affected == 0 {
            debug!(user_id, "没有需要标记的通知，可能已读或不存在");
        } else {
            info!(user_id, affected, "通知已标记为已读");
        }

        Ok(affected)
    }

    // ==================== 查询操作 ====================

    /// 分页查询用户全部通知
    pub async fn get_user_notifications(
        &self,
        username: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>> {
        self.list_notifications(LIST_NOTIFICATIONS_SQL, username, limit, offset)
            .await
    }

    /// 分页查询用户未读通知
    pub async fn get_unseen_notifications(
        &self,
        username: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>> {
        self.list_notifications(LIST_UNSEEN_NOTIFICATIONS_SQL, username, limit, offset)
            .await
    }

    async fn list_notifications(
        &self,
        sql: &'static str,
        username: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>> {
        let user_id = self
            .resolve_user_id(UserLookupColumn::Username, username)
            .await?;

        let notifications = sqlx::query_as::<_, Notification>(sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        debug!(user_id, count = notifications.len(), "查询通知完成");
        Ok(notifications)
    }

    /// 按用户名查询用户资料
    pub async fn check_if_username_exist(&self, username: &str) -> Result<UserRecord> {
        self.fetch_user_by(UserLookupColumn::Username, username)
            .await
    }
}

#[async_trait]
impl NotificationRepositoryTrait for NotificationRepository {
    async fn create_notification(&self, notification: &NewNotification) -> Result<i64> {
        self.create_notification(notification).await
    }

    async fn get_user_notifications(
        &self,
        username: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>> {
        self.get_user_notifications(username, limit, offset).await
    }

    async fn get_unseen_notifications(
        &self,
        username: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>> {
        self.get_unseen_notifications(username, limit, offset).await
    }

    async fn mark_notifications_as_seen(
        &self,
        notification_ids: &[i64],
        username: &str,
    ) -> Result<u64> {
        self.mark_notifications_as_seen(notification_ids, username)
            .await
    }

    async fn check_if_username_exist(&self, username: &str) -> Result<UserRecord> {
        self.check_if_username_exist(username).await
    }
}
