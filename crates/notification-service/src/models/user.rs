//! 用户查询模型

use serde::Serialize;

/// 按用户名查询得到的用户资料
///
/// 联表 user_account / user_auth_info / email_validation_status / user_status 得到，
/// 不携带密码哈希与各类令牌。
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct UserRecord {
    /// 内部主键
    pub id: i64,
    /// 外部账户 ID
    pub account_id: String,
    pub username: String,
    #[sqlx(default)]
    pub first_name: Option<String>,
    #[sqlx(default)]
    pub last_name: Option<String>,
    #[sqlx(default)]
    pub email: Option<String>,
    #[sqlx(default)]
    pub email_verification_status: Option<String>,
    #[sqlx(default)]
    pub user_status: Option<String>,
}

/// 允许用于查询用户的列
///
/// 列名只能来自这里的静态字符串，调用方传入的值一律走参数绑定。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserLookupColumn {
    Username,
    AccountId,
    Email,
}

impl UserLookupColumn {
    pub fn column(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::AccountId => "account_id",
            Self::Email => "email",
        }
    }
}

impl std::fmt::Display for UserLookupColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_columns_are_static() {
        assert_eq!(UserLookupColumn::Username.column(), "username");
        assert_eq!(UserLookupColumn::AccountId.column(), "account_id");
        assert_eq!(UserLookupColumn::Email.to_string(), "email");
    }
}
