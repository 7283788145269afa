//! 用户行为事件模型
//!
//! 认证服务与用户服务在用户注册、点赞、关注等时刻向队列发布 JSON 事件，
//! 通知服务据此生成站内通知。此处定义事件的解码格式和行为类型枚举。

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// ActionKind: 行为类型
// ---------------------------------------------------------------------------

/// 行为类型
///
/// 未识别的取值保留原始字符串，便于日志排查；解码永远不会因为行为类型失败。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    UserRegistered,
    BlogLiked,
    UserFollowed,
    Unrecognized(String),
}

impl ActionKind {
    pub const USER_REGISTER: &'static str = "user_register";
    pub const BLOG_LIKE: &'static str = "blog_like";
    pub const USER_FOLLOWED: &'static str = "user_followed";

    pub fn as_str(&self) -> &str {
        match self {
            Self::UserRegistered => Self::USER_REGISTER,
            Self::BlogLiked => Self::BLOG_LIKE,
            Self::UserFollowed => Self::USER_FOLLOWED,
            Self::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl Default for ActionKind {
    fn default() -> Self {
        Self::Unrecognized(String::new())
    }
}

impl From<String> for ActionKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            Self::USER_REGISTER => Self::UserRegistered,
            Self::BLOG_LIKE => Self::BlogLiked,
            Self::USER_FOLLOWED => Self::UserFollowed,
            _ => Self::Unrecognized(raw),
        }
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Unrecognized(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ActionEvent: 队列消息
// ---------------------------------------------------------------------------

/// 队列中的用户行为事件
///
/// 生产方对缺省字段发送空字符串，解码时统一视为 `None`。
/// 认证服务使用 `profile_id` 作为账户 ID 字段名，两者同时出现时以非空的 `account_id` 为准。
/// 其余辅助字段（email、client、ip 等）与通知无关，解码时忽略。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ActionEventWire")]
pub struct ActionEvent {
    pub action: ActionKind,
    /// 行为发起者的外部账户 ID
    pub account_id: String,
    /// 行为发起者的用户名
    pub username: String,
    /// 第二个用户名，仅关注事件使用，表示被关注者
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_username: Option<String>,
    /// 通知正文
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<String>,
    /// 关联博客的外部 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blog_id: Option<String>,
}

/// 队列消息的原始字段
#[derive(Deserialize)]
struct ActionEventWire {
    #[serde(default)]
    action: ActionKind,
    #[serde(default)]
    account_id: String,
    #[serde(default)]
    profile_id: String,
    #[serde(default)]
    username: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    new_username: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    notification: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    blog_id: Option<String>,
}

impl From<ActionEventWire> for ActionEvent {
    fn from(wire: ActionEventWire) -> Self {
        let account_id = if wire.account_id.is_empty() {
            wire.profile_id
        } else {
            wire.account_id
        };

        Self {
            action: wire.action,
            account_id,
            username: wire.username,
            new_username: wire.new_username,
            notification: wire.notification,
            blog_id: wire.blog_id,
        }
    }
}

impl ActionEvent {
    pub fn new(
        action: ActionKind,
        account_id: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            action,
            account_id: account_id.into(),
            username: username.into(),
            ..Default::default()
        }
    }

    pub fn with_new_username(mut self, new_username: impl Into<String>) -> Self {
        self.new_username = Some(new_username.into());
        self
    }

    pub fn with_notification(mut self, notification: impl Into<String>) -> Self {
        self.notification = Some(notification.into());
        self
    }

    pub fn with_blog_id(mut self, blog_id: impl Into<String>) -> Self {
        self.blog_id = Some(blog_id.into());
        self
    }

    /// 通知正文，缺省为空串
    pub fn notification_text(&self) -> &str {
        self.notification.as_deref().unwrap_or_default()
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_kind_parsing() {
        assert_eq!(ActionKind::from("user_register".to_string()), ActionKind::UserRegistered);
        assert_eq!(ActionKind::from("blog_like".to_string()), ActionKind::BlogLiked);
        assert_eq!(ActionKind::from("user_followed".to_string()), ActionKind::UserFollowed);

        let unknown = ActionKind::from("blog_publish".to_string());
        assert_eq!(unknown, ActionKind::Unrecognized("blog_publish".to_string()));
        assert!(!unknown.is_recognized());
        assert_eq!(unknown.to_string(), "blog_publish");
    }

    #[test]
    fn test_decode_register_event() {
        let payload = r#"{
            "id": 0,
            "account_id": "A1",
            "username": "alice",
            "new_username": "",
            "email": "alice@example.com",
            "action": "user_register",
            "blog_id": "",
            "notification": ""
        }"#;

        let event: ActionEvent = serde_json::from_str(payload).unwrap();
        assert_eq!(event.action, ActionKind::UserRegistered);
        assert_eq!(event.account_id, "A1");
        assert_eq!(event.username, "alice");
        assert_eq!(event.new_username, None);
        assert_eq!(event.blog_id, None);
        assert_eq!(event.notification_text(), "");
    }

    #[test]
    fn test_decode_profile_id_alias() {
        let payload = r#"{"profile_id":"A9","username":"zoe","action":"user_register"}"#;

        let event: ActionEvent = serde_json::from_str(payload).unwrap();
        assert_eq!(event.account_id, "A9");
    }

    #[test]
    fn test_decode_account_id_and_profile_id_together() {
        let payload = r#"{
            "action": "user_register",
            "account_id": "A1",
            "profile_id": "P1",
            "username": "alice"
        }"#;
        let event: ActionEvent = serde_json::from_str(payload).unwrap();
        assert_eq!(event.account_id, "A1");

        let payload = r#"{"action":"user_register","account_id":"","profile_id":"P1","username":"alice"}"#;
        let event: ActionEvent = serde_json::from_str(payload).unwrap();
        assert_eq!(event.account_id, "P1");
    }

    #[test]
    fn test_decode_follow_event() {
        let payload = r#"{
            "account_id": "A1",
            "username": "alice",
            "new_username": "bob",
            "action": "user_followed",
            "notification": "alice has followed you"
        }"#;

        let event: ActionEvent = serde_json::from_str(payload).unwrap();
        assert_eq!(event.action, ActionKind::UserFollowed);
        assert_eq!(event.new_username.as_deref(), Some("bob"));
        assert_eq!(event.notification_text(), "alice has followed you");
    }

    #[test]
    fn test_decode_missing_action_is_unrecognized() {
        let event: ActionEvent = serde_json::from_str(r#"{"username":"alice"}"#).unwrap();
        assert_eq!(event.action, ActionKind::Unrecognized(String::new()));
    }

    #[test]
    fn test_decode_rejects_malformed_payload() {
        assert!(serde_json::from_str::<ActionEvent>("not json").is_err());
        assert!(serde_json::from_str::<ActionEvent>(r#"{"action": 42}"#).is_err());
    }

    #[test]
    fn test_encode_skips_absent_fields() {
        let event = ActionEvent::new(ActionKind::BlogLiked, "A1", "alice").with_blog_id("blog-1");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["action"], "blog_like");
        assert_eq!(json["blog_id"], "blog-1");
        assert!(json.get("new_username").is_none());
    }
}
