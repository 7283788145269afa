//! Kafka 消费者
//!
//! 将 Kafka 消息解码为行为事件并交给 ActionDispatcher 处理。
//! 位点自动提交，解码失败或落库失败的消息只记录日志，不重试也不进入死信队列。

use notification_shared::config::KafkaConfig;
use notification_shared::events::ActionEvent;
use notification_shared::kafka::{ConsumerMessage, KafkaConsumer};
use notification_shared::observability::metrics;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::{NotificationError, Result};
use crate::processor::{ActionDispatcher, DispatchOutcome};
use crate::repository::NotificationRepositoryTrait;

/// 行为事件消费者
pub struct ActionConsumer<R: NotificationRepositoryTrait> {
    consumer: KafkaConsumer,
    dispatcher: ActionDispatcher<R>,
}

impl<R: NotificationRepositoryTrait> ActionConsumer<R> {
    /// 连接 Kafka 并订阅行为事件 topic
    pub fn new(config: &KafkaConfig, dispatcher: ActionDispatcher<R>) -> Result<Self> {
        let consumer = KafkaConsumer::connect(config)?;
        Ok(Self {
            consumer,
            dispatcher,
        })
    }

    /// 启动消费循环，直到收到 shutdown 信号
    pub async fn run(self, shutdown: watch::Receiver<bool>) {
        info!(topic = %self.consumer.topic(), "行为事件消费者已启动");

        let dispatcher = self.dispatcher;

        self.consumer
            .consume(shutdown, |msg| {
                let dispatcher = &dispatcher;
                async move {
                    // 单条消息的失败在此终结，不影响后续消息
                    if let Err(e) = handle_message(dispatcher, &msg).await {
                        error!(
                            error = %e,
                            code = e.error_code(),
                            partition = msg.partition,
                            offset = msg.offset,
                            "处理行为事件失败，消息已丢弃"
                        );
                    }
                }
            })
            .await;

        info!("行为事件消费者已停止");
    }
}

/// 处理单条 Kafka 消息：解码 -> 分发
pub async fn handle_message<R: NotificationRepositoryTrait>(
    dispatcher: &ActionDispatcher<R>,
    msg: &ConsumerMessage,
) -> Result<DispatchOutcome> {
    let event: ActionEvent = msg.decode().map_err(|e| {
        warn!(error = %e, offset = msg.offset, "行为事件解码失败");
        metrics::record_action_event("unknown", "decode_failed");
        NotificationError::Decode(e.to_string())
    })?;

    info!(
        action = %event.action,
        account_id = %event.account_id,
        username = %event.username,
        "收到行为事件"
    );

    let result = dispatcher.dispatch(&event).await;

    let outcome = match &result {
        Ok(DispatchOutcome::Created { .. }) => "created",
        Ok(DispatchOutcome::Ignored) => "skipped",
        Err(_) => "failed",
    };
    metrics::record_action_event(event.action.as_str(), outcome);

    result
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use notification_shared::kafka::topics;

    use super::*;
    use crate::models::UserRecord;
    use crate::repository::MockNotificationRepositoryTrait;

    fn message(payload: &str) -> ConsumerMessage {
        ConsumerMessage::new(topics::NOTIFICATION_ACTIONS, payload.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_malformed_payload_is_decode_error() {
        let mut repo = MockNotificationRepositoryTrait::new();
        repo.expect_create_notification().never();
        let dispatcher = ActionDispatcher::new(Arc::new(repo));

        let err = handle_message(&dispatcher, &message("{not json"))
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::Decode(_)));
    }

    #[tokio::test]
    async fn test_register_message_is_dispatched() {
        let mut repo = MockNotificationRepositoryTrait::new();
        repo.expect_create_notification()
            .withf(|n| n.account_id == "A1" && n.notification_type == "AccountCreated")
            .times(1)
            .returning(|_| Ok(10));
        let dispatcher = ActionDispatcher::new(Arc::new(repo));

        let outcome = handle_message(
            &dispatcher,
            &message(r#"{"action":"user_register","account_id":"A1","username":"alice","blog_id":""}"#),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, DispatchOutcome::Created { id: 10, .. }));
    }

    #[tokio::test]
    async fn test_follow_message_targets_followed_user() {
        let mut repo = MockNotificationRepositoryTrait::new();
        repo.expect_check_if_username_exist()
            .withf(|username| username == "bob")
            .returning(|_| {
                Ok(UserRecord {
                    id: 2,
                    account_id: "A2".to_string(),
                    username: "bob".to_string(),
                    first_name: None,
                    last_name: None,
                    email: None,
                    email_verification_status: None,
                    user_status: None,
                })
            });
        repo.expect_create_notification()
            .withf(|n| n.account_id == "A2" && n.related_user_account_id.as_deref() == Some("A1"))
            .times(1)
            .returning(|_| Ok(11));
        let dispatcher = ActionDispatcher::new(Arc::new(repo));

        let payload = r#"{
            "action": "user_followed",
            "account_id": "A1",
            "username": "alice",
            "new_username": "bob",
            "notification": "alice has followed you"
        }"#;

        let outcome = handle_message(&dispatcher, &message(payload)).await.unwrap();
        assert!(matches!(outcome, DispatchOutcome::Created { id: 11, .. }));
    }

    #[tokio::test]
    async fn test_unknown_action_is_skipped() {
        let mut repo = MockNotificationRepositoryTrait::new();
        repo.expect_create_notification().never();
        let dispatcher = ActionDispatcher::new(Arc::new(repo));

        let outcome = handle_message(
            &dispatcher,
            &message(r#"{"action":"blog_publish","account_id":"A1","username":"alice"}"#),
        )
        .await
        .unwrap();

        assert_eq!(outcome, DispatchOutcome::Ignored);
    }
}
