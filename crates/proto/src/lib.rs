//! 通知服务 Proto 定义
//!
//! 由 build.rs 在编译期生成，包名保持 `notification_svc` 以兼容网关侧已有客户端。

pub mod notification {
    tonic::include_proto!("notification_svc");
}
