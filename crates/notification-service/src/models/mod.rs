//! 领域模型
//!
//! - `notification`: 通知记录、通知类型、投递渠道
//! - `user`: 用户查询结果与允许的查询列

mod notification;
mod user;

pub use notification::*;
pub use user::*;
