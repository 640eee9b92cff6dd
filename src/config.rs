use crate::error::{AppResult, ConfigError};
use serde::Deserialize;
use std::path::Path;

/// 程序配置
///
/// 加载顺序：默认值 → TOML 配置文件（可选）→ 环境变量
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 后端 REST API 地址
    pub api_base_url: String,
    /// 登录令牌（不写入日志）
    pub api_token: Option<String>,
    /// 计时器节拍（毫秒）
    pub tick_interval_ms: u64,
    /// 剩余时间低于该值（秒）时计时器显示为紧急状态
    pub urgent_threshold_secs: u64,
    /// 日志级别（RUST_LOG 优先）
    pub log_level: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5206/api".to_string(),
            api_token: None,
            tick_interval_ms: 1000,
            urgent_threshold_secs: 300,
            log_level: "info".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载配置，再叠加环境变量
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;
        Ok(config.with_env_overrides())
    }

    /// 按 `TAKE_EXAM_CONFIG` 决定是否读取配置文件
    pub fn resolve() -> AppResult<Self> {
        match std::env::var("TAKE_EXAM_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Ok(Self::load(path.trim())?),
            _ => Ok(Self::from_env()),
        }
    }

    /// 解析 TOML 文本，缺省字段使用默认值
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn with_env_overrides(self) -> Self {
        Self {
            api_base_url: std::env::var("EXAM_API_BASE_URL").unwrap_or(self.api_base_url),
            api_token: std::env::var("EXAM_API_TOKEN").ok().or(self.api_token),
            tick_interval_ms: std::env::var("EXAM_TICK_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.tick_interval_ms),
            urgent_threshold_secs: std::env::var("EXAM_URGENT_THRESHOLD_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.urgent_threshold_secs),
            log_level: std::env::var("EXAM_LOG_LEVEL").unwrap_or(self.log_level),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:5206/api");
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.urgent_threshold_secs, 300);
        assert!(config.api_token.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            api_base_url = "https://exam.example.edu/api"
            api_token = "abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.api_base_url, "https://exam.example.edu/api");
        assert_eq!(config.api_token.as_deref(), Some("abc"));
        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(Config::from_toml_str("tick_interval_ms = \"soon\"").is_err());
    }

    #[test]
    fn test_resolve_reports_missing_config_file() {
        std::env::set_var("TAKE_EXAM_CONFIG", "/definitely/not/here.toml");
        let result = Config::resolve();
        std::env::remove_var("TAKE_EXAM_CONFIG");
        assert!(matches!(
            result,
            Err(crate::error::AppError::Config(ConfigError::ReadFailed { .. }))
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFailed { .. }));
    }
}
