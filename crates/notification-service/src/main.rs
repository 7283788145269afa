//! 通知服务
//!
//! 消费 Kafka 用户行为事件生成站内通知，并提供通知查询 gRPC 服务。

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use notification_proto::notification::notification_service_server::NotificationServiceServer;
use notification_shared::{config::AppConfig, database::Database, observability};
use tokio::signal;
use tokio::sync::watch;
use tonic::transport::Server;
use tracing::{error, info, warn};

use notification_service::{
    ActionConsumer, ActionDispatcher, NotificationRepository, NotificationServiceImpl,
};

const SERVICE_NAME: &str = "notification-service";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载配置，失败时回退默认值，错误待日志初始化后再记录
    let (config, load_error) = match AppConfig::load(SERVICE_NAME) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::fallback(SERVICE_NAME), Some(e)),
    };

    // 2. 初始化可观测性
    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    if let Some(e) = load_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    info!("Starting notification-service...");
    info!(environment = %config.environment, "Configuration loaded");

    let grpc_addr: SocketAddr = config.server_addr().parse()?;

    // 3. 初始化数据库连接，连接失败直接退出
    let db = Database::connect(&config.database).await?;
    db.health_check().await?;
    info!("Database connection established");

    if config.database.run_migrations {
        db.run_migrations().await?;
    }

    // 4. 创建仓储，消费者与 gRPC 服务共享
    let repo = Arc::new(NotificationRepository::new(db.pool().clone()));

    // 5. 启动 Kafka 消费者
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let consumer = ActionConsumer::new(&config.kafka, ActionDispatcher::new(repo.clone()))?;
    let consumer_task = tokio::spawn(consumer.run(shutdown_rx));
    let consumer_abort = consumer_task.abort_handle();

    // 6. 信号处理：立即中止消费者，不等待正在处理的消息，然后通知 gRPC 服务退出
    let mut server_shutdown = shutdown_tx.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        consumer_abort.abort();
        let _ = shutdown_tx.send(true);
    });

    // 7. 启动 gRPC 服务
    let grpc_service = NotificationServiceImpl::new(repo);
    info!("gRPC server listening on {}", grpc_addr);

    Server::builder()
        .add_service(NotificationServiceServer::new(grpc_service))
        .serve_with_shutdown(grpc_addr, async move {
            let _ = server_shutdown.wait_for(|stop| *stop).await;
        })
        .await?;

    if let Err(e) = consumer_task.await
        && !e.is_cancelled()
    {
        warn!(error = %e, "消费者任务异常结束");
    }

    db.close().await;
    info!("Service shutdown complete");
    Ok(())
}

/// 监听 Ctrl+C 和 SIGTERM 信号
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}
