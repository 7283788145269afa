//! 行为事件分发
//!
//! 按事件的行为类型决定生成哪种通知、通知归属于谁。
//! 分发器不持有状态，所有持久化都经由仓储完成。

use std::sync::Arc;

use notification_shared::events::{ActionEvent, ActionKind};
use notification_shared::observability::metrics;
use tracing::{info, warn};

use crate::error::{NotificationError, Result};
use crate::models::{NewNotification, NotificationKind, WELCOME_MESSAGE};
use crate::repository::NotificationRepositoryTrait;

/// 单个事件的分发结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 已生成一条通知
    Created { id: i64, kind: NotificationKind },
    /// 未识别的行为类型，未做任何修改
    Ignored,
}

/// 行为事件分发器
pub struct ActionDispatcher<R: NotificationRepositoryTrait> {
    repo: Arc<R>,
}

impl<R: NotificationRepositoryTrait> ActionDispatcher<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// 分发一个事件
    ///
    /// - 注册：为注册者生成欢迎通知
    /// - 点赞：为点赞者生成点赞通知，关联博客
    /// - 关注：先解析被关注者，通知归属于被关注者而非关注者
    /// - 其他：记录后忽略
    pub async fn dispatch(&self, event: &ActionEvent) -> Result<DispatchOutcome> {
        let (kind, request) = match &event.action {
            ActionKind::UserRegistered => (
                NotificationKind::AccountCreated,
                NewNotification::new(
                    &event.account_id,
                    NotificationKind::AccountCreated,
                    WELCOME_MESSAGE,
                )
                .with_related_user(&event.account_id),
            ),
            ActionKind::BlogLiked => (
                NotificationKind::BlogLiked,
                NewNotification::new(
                    &event.account_id,
                    NotificationKind::BlogLiked,
                    event.notification_text(),
                )
                .with_related_blog(event.blog_id.clone())
                .with_related_user(&event.account_id),
            ),
            ActionKind::UserFollowed => {
                let followed = self.resolve_followed_user(event).await?;
                (
                    NotificationKind::NewFollower,
                    NewNotification::new(
                        followed,
                        NotificationKind::NewFollower,
                        event.notification_text(),
                    )
                    .with_related_blog(event.blog_id.clone())
                    .with_related_user(&event.account_id),
                )
            }
            ActionKind::Unrecognized(raw) => {
                warn!(action = %raw, username = %event.username, "未识别的行为类型，忽略");
                return Ok(DispatchOutcome::Ignored);
            }
        };

        let id = self.repo.create_notification(&request).await?;
        metrics::record_notification_created(kind.as_str());

        info!(
            notification_id = id,
            action = %event.action,
            notification_type = %kind,
            recipient = %request.account_id,
            "行为事件已生成通知"
        );

        Ok(DispatchOutcome::Created { id, kind })
    }

    /// 被关注者用户名 -> 外部账户 ID
    async fn resolve_followed_user(&self, event: &ActionEvent) -> Result<String> {
        let Some(new_username) = event.new_username.as_deref() else {
            return Err(NotificationError::Validation(
                "关注事件缺少被关注者用户名".to_string(),
            ));
        };

        let followed = self.repo.check_if_username_exist(new_username).await?;
        Ok(followed.account_id)
    }
}

impl<R: NotificationRepositoryTrait> Clone for ActionDispatcher<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRecord;
    use crate::repository::MockNotificationRepositoryTrait;

    fn user(id: i64, account_id: &str, username: &str) -> UserRecord {
        UserRecord {
            id,
            account_id: account_id.to_string(),
            username: username.to_string(),
            first_name: None,
            last_name: None,
            email: None,
            email_verification_status: None,
            user_status: None,
        }
    }

    #[tokio::test]
    async fn test_register_creates_welcome_notification() {
        let mut repo = MockNotificationRepositoryTrait::new();
        repo.expect_create_notification()
            .withf(|n| {
                n.account_id == "A1"
                    && n.notification_type == "AccountCreated"
                    && n.message == WELCOME_MESSAGE
                    && n.channel == "Browser"
                    && n.related_user_account_id.as_deref() == Some("A1")
                    && n.related_blog_id.is_none()
            })
            .times(1)
            .returning(|_| Ok(1));

        let dispatcher = ActionDispatcher::new(Arc::new(repo));
        let event = ActionEvent::new(ActionKind::UserRegistered, "A1", "alice");

        let outcome = dispatcher.dispatch(&event).await.unwrap();
        assert_eq!(
            outcome,
            DispatchOutcome::Created {
                id: 1,
                kind: NotificationKind::AccountCreated
            }
        );
    }

    #[tokio::test]
    async fn test_blog_like_carries_text_and_blog() {
        let mut repo = MockNotificationRepositoryTrait::new();
        repo.expect_create_notification()
            .withf(|n| {
                n.account_id == "A1"
                    && n.notification_type == "BlogLiked"
                    && n.message == "alice liked your blog"
                    && n.related_blog_id.as_deref() == Some("blog-7")
                    && n.related_user_account_id.as_deref() == Some("A1")
            })
            .times(1)
            .returning(|_| Ok(2));

        let dispatcher = ActionDispatcher::new(Arc::new(repo));
        let event = ActionEvent::new(ActionKind::BlogLiked, "A1", "alice")
            .with_notification("alice liked your blog")
            .with_blog_id("blog-7");

        let outcome = dispatcher.dispatch(&event).await.unwrap();
        assert!(matches!(outcome, DispatchOutcome::Created { id: 2, .. }));
    }

    #[tokio::test]
    async fn test_follow_notifies_followed_user() {
        let mut repo = MockNotificationRepositoryTrait::new();
        repo.expect_check_if_username_exist()
            .withf(|username| username == "bob")
            .times(1)
            .returning(|_| Ok(user(2, "A2", "bob")));
        repo.expect_create_notification()
            .withf(|n| {
                n.account_id == "A2"
                    && n.notification_type == "NewFollower"
                    && n.related_user_account_id.as_deref() == Some("A1")
            })
            .times(1)
            .returning(|_| Ok(3));

        let dispatcher = ActionDispatcher::new(Arc::new(repo));
        let event = ActionEvent::new(ActionKind::UserFollowed, "A1", "alice")
            .with_new_username("bob")
            .with_notification("alice has followed you");

        let outcome = dispatcher.dispatch(&event).await.unwrap();
        assert_eq!(
            outcome,
            DispatchOutcome::Created {
                id: 3,
                kind: NotificationKind::NewFollower
            }
        );
    }

    #[tokio::test]
    async fn test_follow_unknown_target_creates_nothing() {
        let mut repo = MockNotificationRepositoryTrait::new();
        repo.expect_check_if_username_exist()
            .times(1)
            .returning(|username| Err(NotificationError::not_found("user_account", username)));
        repo.expect_create_notification().never();

        let dispatcher = ActionDispatcher::new(Arc::new(repo));
        let event = ActionEvent::new(ActionKind::UserFollowed, "A1", "alice")
            .with_new_username("ghost");

        let err = dispatcher.dispatch(&event).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_follow_without_target_is_rejected() {
        let mut repo = MockNotificationRepositoryTrait::new();
        repo.expect_check_if_username_exist().never();
        repo.expect_create_notification().never();

        let dispatcher = ActionDispatcher::new(Arc::new(repo));
        let event = ActionEvent::new(ActionKind::UserFollowed, "A1", "alice");

        let err = dispatcher.dispatch(&event).await.unwrap_err();
        assert!(matches!(err, NotificationError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unrecognized_action_touches_nothing() {
        let mut repo = MockNotificationRepositoryTrait::new();
        repo.expect_check_if_username_exist().never();
        repo.expect_create_notification().never();

        let dispatcher = ActionDispatcher::new(Arc::new(repo));
        let event = ActionEvent::new(
            ActionKind::Unrecognized("blog_publish".to_string()),
            "A1",
            "alice",
        );

        let outcome = dispatcher.dispatch(&event).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_store_failure_is_propagated() {
        let mut repo = MockNotificationRepositoryTrait::new();
        repo.expect_create_notification()
            .times(1)
            .returning(|_| Err(NotificationError::not_found("notification_type", "AccountCreated")));

        let dispatcher = ActionDispatcher::new(Arc::new(repo));
        let event = ActionEvent::new(ActionKind::UserRegistered, "A1", "alice");

        assert!(dispatcher.dispatch(&event).await.is_err());
    }
}
