//! 数据库仓储层
//!
//! 通知的持久化与全部标识解析都在这里完成，上层不直接执行 SQL。
//!
//! ## 设计原则
//!
//! - 写操作先逐一解析所有外部引用，任何一项解析失败即返回 NotFound，不发出写语句
//! - 每个操作由若干独立语句组成，不包裹事务；最终写入是单条语句，不会留下半条记录
//! - 定义 trait 接口以支持 mock 测试

mod notification_repo;
mod traits;

pub use notification_repo::NotificationRepository;
pub use traits::*;
