//! 通知相关实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 通知记录
///
/// 查询时联表 notification_type 与 notification_channel，带出类型名和渠道名
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    /// 所属用户的内部主键
    pub user_id: i64,
    pub notification_type_id: i32,
    pub notification_name: String,
    pub message: String,
    #[sqlx(default)]
    pub related_blog_id: Option<i64>,
    #[sqlx(default)]
    pub related_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub seen: bool,
    pub delivery_status: String,
    pub channel_name: String,
}

/// 通知类型
///
/// 取值与 notification_type 表中的 notification_name 一一对应
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    AccountCreated,
    BlogLiked,
    NewFollower,
    PasswordReset,
    CommentReply,
    CoAuthorInvitation,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccountCreated => "AccountCreated",
            Self::BlogLiked => "BlogLiked",
            Self::NewFollower => "NewFollower",
            Self::PasswordReset => "PasswordReset",
            Self::CommentReply => "CommentReply",
            Self::CoAuthorInvitation => "CoAuthorInvitation",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 投递渠道
///
/// 目前只有站内（Browser）真正被使用，其余渠道仅存在于数据模型中
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationChannel {
    Browser,
    Email,
    Sms,
    Push,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browser => "Browser",
            Self::Email => "Email",
            Self::Sms => "SMS",
            Self::Push => "Push",
        }
    }
}

impl std::fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 新建通知的默认投递状态
pub const DELIVERY_STATUS_PENDING: &str = "pending";

/// 新用户注册时的欢迎语
pub const WELCOME_MESSAGE: &str = "Welcome to The Monkeys!";

/// 创建通知请求
///
/// 所有引用均为外部标识（账户 ID、类型名、渠道名、博客 ID），由仓储解析为内部主键
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    /// 通知接收者的外部账户 ID
    pub account_id: String,
    pub notification_type: String,
    pub message: String,
    pub related_blog_id: Option<String>,
    /// 关联用户的外部账户 ID
    pub related_user_account_id: Option<String>,
    pub channel: String,
}

impl NewNotification {
    /// 默认投递到 Browser 渠道，不带关联博客与关联用户
    pub fn new(
        account_id: impl Into<String>,
        kind: NotificationKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            notification_type: kind.as_str().to_string(),
            message: message.into(),
            related_blog_id: None,
            related_user_account_id: None,
            channel: NotificationChannel::Browser.as_str().to_string(),
        }
    }

    pub fn with_related_blog(mut self, blog_id: Option<String>) -> Self {
        self.related_blog_id = blog_id.filter(|id| !id.is_empty());
        self
    }

    pub fn with_related_user(mut self, account_id: impl Into<String>) -> Self {
        let account_id = account_id.into();
        self.related_user_account_id = (!account_id.is_empty()).then_some(account_id);
        self
    }

    /// 直接指定类型名，用于类型表中尚未建模为枚举的类型
    pub fn with_type_name(mut self, notification_type: impl Into<String>) -> Self {
        self.notification_type = notification_type.into();
        self
    }

    /// 直接指定渠道名
    pub fn with_channel_name(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }
}
