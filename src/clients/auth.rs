use std::fmt;

/// 登录会话
///
/// 显式注入到 [`ExamClient`](super::ExamClient)，不从全局状态读取令牌。
#[derive(Clone, Default)]
pub struct AuthSession {
    token: Option<String>,
}

impl AuthSession {
    /// 未登录
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    /// 使用已有令牌，空白令牌视为未登录
    pub fn with_token(token: impl Into<String>) -> Self {
        let token = token.into();
        let token = token.trim();
        Self {
            token: (!token.is_empty()).then(|| token.to_string()),
        }
    }

    pub fn from_optional(token: Option<&str>) -> Self {
        token.map(Self::with_token).unwrap_or_default()
    }

    /// Bearer 令牌
    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}
