//! 错误类型
//!
//! 库内部统一使用 `thiserror` 定义的枚举，应用层（`main` / `App`）使用 `anyhow`。
//! 库对外的入口（配置解析、作答历史）返回 [`AppResult`]，状态机操作直接返回 [`SessionError`]。

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败（连接失败、读取响应失败等）
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 非 2xx 状态码，且响应体不是标准信封
    #[error("API返回错误状态 ({endpoint}): HTTP {status}")]
    BadStatus { endpoint: String, status: u16 },
    /// 信封中 `success` 为 false
    #[error("API拒绝请求 ({endpoint}): code={status_code:?}, message={message:?}")]
    Rejected {
        endpoint: String,
        status_code: Option<u16>,
        message: Option<String>,
    },
    /// 成功响应但缺少 `data`
    #[error("API返回空结果: {endpoint}")]
    EmptyResponse { endpoint: String },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// 构造一个被后端拒绝的错误
    pub fn rejected(
        endpoint: impl Into<String>,
        status_code: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        ApiError::Rejected {
            endpoint: endpoint.into(),
            status_code,
            message: Some(message.into()),
        }
    }

    /// 状态码：优先取信封里的 `statusCode`，其次取 HTTP 状态
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::RequestFailed { source, .. } => source.status().map(|s| s.as_u16()),
            ApiError::BadStatus { status, .. } => Some(*status),
            ApiError::Rejected { status_code, .. } => *status_code,
            ApiError::EmptyResponse { .. } | ApiError::JsonParseFailed { .. } => None,
        }
    }

    /// 面向用户展示的原始错误信息
    ///
    /// 后端拒绝时返回后端的 `message`，其余情况返回底层错误描述。
    /// 没有可展示的内容时返回空字符串。
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Rejected { message, .. } => message.clone().unwrap_or_default(),
            ApiError::RequestFailed { source, .. } => source.to_string(),
            ApiError::BadStatus { status, .. } => format!("Request failed with status code {}", status),
            ApiError::EmptyResponse { .. } => String::new(),
            ApiError::JsonParseFailed { source, .. } => source.to_string(),
        }
    }

    /// 是否为 403 Forbidden
    pub fn is_forbidden(&self) -> bool {
        self.status_code() == Some(403)
    }
}

/// 考试会话（状态机）错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// 当前状态不允许该操作
    #[error("当前状态 {state} 不允许操作: {action}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },
    /// 题目不属于本次会话
    #[error("题目 {question_id} 不在本次考试中")]
    UnknownQuestion { question_id: i64 },
    /// 选项不属于该题目
    #[error("选项 {answer_id} 不属于题目 {question_id}")]
    UnknownOption { question_id: i64, answer_id: i64 },
    /// 选项字母或序号无法识别
    #[error("无法识别的选项: {choice}")]
    UnknownChoice { choice: String },
    /// 索引超出范围
    #[error("索引 {index} 超出范围 (共 {len} 题)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
