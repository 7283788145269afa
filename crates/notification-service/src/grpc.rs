//! gRPC 服务端实现
//!
//! 将仓储层暴露为 gRPC 接口，处理 Proto 类型与内部模型之间的转换。
//! 仓储错误原样透传为 gRPC Status，不返回部分结果。

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};
use tracing::{debug, info, instrument, warn};

use notification_proto::notification::{
    DeleteNotificationReq, DeleteNotificationRes, GetNotificationReq, GetNotificationRes,
    Notification as ProtoNotification, NotificationResponse, SendNotificationReq,
    SendNotificationRes, WatchNotificationReq,
    notification_service_server::NotificationService,
};
use notification_shared::observability::metrics;

use crate::error::NotificationError;
use crate::models::Notification;
use crate::repository::NotificationRepositoryTrait;

/// NotificationSeen 成功时的状态值
const STATUS_OK: i32 = 200;

/// 流式响应的通道容量
const STREAM_BUFFER: usize = 16;

// ==================== 类型转换辅助函数 ====================

/// 将 chrono::DateTime 转换为 prost_types::Timestamp
fn datetime_to_timestamp(dt: chrono::DateTime<chrono::Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: dt.timestamp(),
        nanos: dt.timestamp_subsec_nanos() as i32,
    }
}

/// 内部通知记录 -> Proto 通知
///
/// user_id 字段回显请求中的用户名，而非内部主键
fn notification_to_proto(notification: &Notification, username: &str) -> ProtoNotification {
    ProtoNotification {
        id: notification.id.to_string(),
        user_id: username.to_string(),
        message: notification.message.clone(),
        status: notification.delivery_status.clone(),
        seen: notification.seen,
        created_at: Some(datetime_to_timestamp(notification.created_at)),
    }
}

/// 解析请求中的通知 ID 列表，任何一个无法解析都视为整个请求非法
fn parse_notification_ids(notifications: &[ProtoNotification]) -> Result<Vec<i64>, Status> {
    notifications
        .iter()
        .map(|n| {
            n.id.parse::<i64>().map_err(|_| {
                Status::from(NotificationError::Validation(format!(
                    "非法的通知 ID: {:?}",
                    n.id
                )))
            })
        })
        .collect()
}

/// 负数分页参数在到达存储层之前拒绝，用户名交由存储层解析
fn validate_list_request(req: &GetNotificationReq) -> Result<(), Status> {
    if req.limit < 0 || req.offset < 0 {
        return Err(Status::invalid_argument("limit 与 offset 不能为负数"));
    }
    Ok(())
}

fn record_request<T>(method: &str, started: Instant, result: &Result<T, Status>) {
    let status = match result {
        Ok(_) => "ok",
        Err(_) => "error",
    };
    metrics::record_grpc_request(method, status, started.elapsed().as_secs_f64());
}

// ==================== gRPC 服务实现 ====================

/// 通知 gRPC 服务
pub struct NotificationServiceImpl<R: NotificationRepositoryTrait> {
    repo: Arc<R>,
}

impl<R: NotificationRepositoryTrait> NotificationServiceImpl<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    async fn list_notifications(&self, req: &GetNotificationReq) -> Result<Vec<ProtoNotification>, Status> {
        validate_list_request(req)?;

        let notifications = self
            .repo
            .get_user_notifications(&req.username, req.limit, req.offset)
            .await
            .map_err(Status::from)?;

        Ok(notifications
            .iter()
            .map(|n| notification_to_proto(n, &req.username))
            .collect())
    }
}

#[tonic::async_trait]
impl<R> NotificationService for NotificationServiceImpl<R>
where
    R: NotificationRepositoryTrait + 'static,
{
    type GetNotificationStreamStream = ReceiverStream<Result<GetNotificationRes, Status>>;

    /// 暂未实现
    async fn send_notification(
        &self,
        _request: Request<SendNotificationReq>,
    ) -> Result<Response<SendNotificationRes>, Status> {
        Err(NotificationError::Unimplemented("SendNotification").into())
    }

    /// 分页查询用户通知
    #[instrument(skip(self, request), fields(username = %request.get_ref().username))]
    async fn get_notification(
        &self,
        request: Request<GetNotificationReq>,
    ) -> Result<Response<GetNotificationRes>, Status> {
        let started = Instant::now();
        let req = request.into_inner();

        let result = self.list_notifications(&req).await;
        record_request("GetNotification", started, &result);

        let notification = result?;
        debug!(count = notification.len(), "返回通知列表");

        Ok(Response::new(GetNotificationRes {
            notification,
            error: String::new(),
        }))
    }

    /// 暂未实现
    async fn delete_notification(
        &self,
        _request: Request<DeleteNotificationReq>,
    ) -> Result<Response<DeleteNotificationRes>, Status> {
        Err(NotificationError::Unimplemented("DeleteNotification").into())
    }

    /// 批量标记已读
    ///
    /// 不属于该用户、已读或不存在的 ID 静默忽略
    #[instrument(skip(self, request), fields(username = %request.get_ref().user_id))]
    async fn notification_seen(
        &self,
        request: Request<WatchNotificationReq>,
    ) -> Result<Response<NotificationResponse>, Status> {
        let started = Instant::now();
        let req = request.into_inner();

        let result = async {
            let ids = parse_notification_ids(&req.notification)?;

            self.repo
                .mark_notifications_as_seen(&ids, &req.user_id)
                .await
                .map_err(Status::from)
        }
        .await;
        record_request("NotificationSeen", started, &result);

        let affected = result?;
        info!(affected, "通知已读标记完成");

        Ok(Response::new(NotificationResponse {
            status: STATUS_OK,
            message: "Notification seen".to_string(),
            error: String::new(),
        }))
    }

    /// 流式返回用户通知，每条消息携带一条通知
    ///
    /// 先完成查询再开始推送，查询失败直接返回错误
    #[instrument(skip(self, request), fields(username = %request.get_ref().username))]
    async fn get_notification_stream(
        &self,
        request: Request<GetNotificationReq>,
    ) -> Result<Response<Self::GetNotificationStreamStream>, Status> {
        let started = Instant::now();
        let req = request.into_inner();

        let result = self.list_notifications(&req).await;
        record_request("GetNotificationStream", started, &result);
        let notifications = result?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let username = req.username;

        tokio::spawn(async move {
            for notification in notifications {
                let id = notification.id.clone();
                let res = GetNotificationRes {
                    notification: vec![notification],
                    error: String::new(),
                };

                if tx.send(Ok(res)).await.is_err() {
                    warn!(username = %username, notification_id = %id, "客户端已断开，停止推送");
                    return;
                }
            }
            debug!(username = %username, "通知推送完成");
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}
