//! Kafka 消费封装
//!
//! 通知服务只订阅一个行为事件 topic，位点自动提交：消息被拉取即视为已确认，
//! 处理结果不影响位点，失败的消息不会被重新投递。

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::KafkaConfig;
use crate::error::{PlatformError, Result};

pub mod topics {
    /// 用户注册、点赞、关注等行为事件，由认证与用户服务发布
    pub const NOTIFICATION_ACTIONS: &str = "notification.user.actions";
}

/// 拉取到的一条消息
///
/// 脱离 rdkafka 借用生命周期，可以跨 await 传递
#[derive(Debug, Clone)]
pub struct ConsumerMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub payload: Vec<u8>,
}

impl ConsumerMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            partition: 0,
            offset: 0,
            payload: payload.into(),
        }
    }

    /// 按 JSON 解码负载
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.payload)
            .map_err(|e| PlatformError::Kafka(format!("消息解码失败: {e}")))
    }
}

impl From<&BorrowedMessage<'_>> for ConsumerMessage {
    fn from(msg: &BorrowedMessage<'_>) -> Self {
        Self {
            topic: msg.topic().to_string(),
            partition: msg.partition(),
            offset: msg.offset(),
            // 空消息保留为空负载，由解码环节报错
            payload: msg.payload().map(<[u8]>::to_vec).unwrap_or_default(),
        }
    }
}

/// 单 topic、自动提交位点的消费者
pub struct KafkaConsumer {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaConsumer {
    /// 创建消费者并订阅配置中的 topic
    pub fn connect(config: &KafkaConfig) -> Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.consumer_group)
            .set("auto.offset.reset", &config.auto_offset_reset)
            .set("enable.auto.commit", "true")
            .create()
            .map_err(|e| PlatformError::Kafka(format!("创建消费者失败: {e}")))?;

        consumer
            .subscribe(&[config.topic.as_str()])
            .map_err(|e| PlatformError::Kafka(format!("订阅 {} 失败: {e}", config.topic)))?;

        info!(
            brokers = %config.brokers,
            group_id = %config.consumer_group,
            topic = %config.topic,
            "Kafka 消费者已订阅"
        );

        Ok(Self {
            consumer,
            topic: config.topic.clone(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// 逐条拉取消息交给 handler，直到 shutdown 变为 true 或发送端被丢弃
    ///
    /// handler 自行处理并记录单条消息的失败；拉取错误只记录日志，循环继续。
    pub async fn consume<F, Fut>(self, mut shutdown: watch::Receiver<bool>, handler: F)
    where
        F: Fn(ConsumerMessage) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(topic = %self.topic, "消费循环收到关闭信号");
                        break;
                    }
                }

                received = self.consumer.recv() => {
                    let msg = match received {
                        Ok(borrowed) => ConsumerMessage::from(&borrowed),
                        Err(e) => {
                            warn!(error = %e, topic = %self.topic, "拉取消息失败");
                            continue;
                        }
                    };
                    debug!(partition = msg.partition, offset = msg.offset, "拉取到消息");
                    handler(msg).await;
                }
            }
        }
    }
}
