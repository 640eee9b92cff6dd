/// 日志工具模块
///
/// 初始化 tracing 订阅器，并提供会话各阶段的日志输出
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化日志
///
/// `RUST_LOG` 优先于配置中的 `log_level`；`verbose_logging` 打开时至少输出 debug。
/// 重复调用是安全的。
pub fn init(config: &Config) {
    let default_level = if config.verbose_logging {
        "debug"
    } else {
        config.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, exam_id: i64) {
    info!("{}", "=".repeat(60));
    info!("🚀 考试客户端启动 - {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("🌐 后端地址: {}", config.api_base_url);
    info!("📝 考试 ID: {}", exam_id);
    info!("{}", "=".repeat(60));
}

/// 记录会话就绪信息
pub fn log_session_ready(title: &str, question_count: usize, remaining: &str) {
    info!("✓ 考试已就绪: {}", truncate_text(title, 40));
    info!("📋 共 {} 道题, 剩余时间 {}", question_count, remaining);
}

/// 记录交卷结果
pub fn log_submitted(percent: f64, passed: bool) {
    info!("\n{}", "─".repeat(60));
    info!("📊 交卷完成: 得分 {:.1}% ({})", percent, if passed { "通过" } else { "未通过" });
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
