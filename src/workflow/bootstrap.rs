//! 会话启动：考试信息 → 开始/继续作答 → 题目列表
//!
//! 三步严格顺序执行，任何一步失败都不会自动重试。

use std::sync::OnceLock;

use regex::Regex;
use tracing::{error, info, warn};

use crate::clients::ExamApi;
use crate::error::ApiError;
use crate::models::{Attempt, Exam, ExamId, SessionQuestion};
use crate::utils::Clock;
use crate::workflow::timer::{format_remaining, remaining_seconds};

/// 次数用尽时展示给学生的提示
pub const MAX_ATTEMPTS_MESSAGE: &str =
    "You have completed all attempts for this exam. (Max attempts reached)";
/// 无权限时的提示前缀
pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to access this exam.";

/// 启动成功后的初始数据
#[derive(Debug, Clone)]
pub struct SessionSeed {
    pub exam: Exam,
    pub attempt: Attempt,
    pub questions: Vec<SessionQuestion>,
    pub remaining_secs: u64,
}

/// 已用/允许的作答次数（从后端消息中解析）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptQuota {
    pub completed: u32,
    pub max: u32,
}

/// 被阻止进入考试的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedReason {
    pub message: String,
    pub quota: Option<AttemptQuota>,
}

/// 启动结果
#[derive(Debug, Clone)]
pub enum BootstrapOutcome {
    Ready(SessionSeed),
    /// 次数用尽或无权限，不可重试
    Blocked(BlockedReason),
    /// 其他错误
    Failed(String),
}

/// 执行启动流程
///
/// # 参数
/// - `api`: 考试接口
/// - `exam_id`: 考试 ID
/// - `clock`: 用于和服务端开始时间对账
pub async fn load_session<A>(api: &A, exam_id: ExamId, clock: &Clock) -> BootstrapOutcome
where
    A: ExamApi + ?Sized,
{
    info!("📥 [考试 {}] 获取考试信息...", exam_id);
    let exam = match api.get_exam(exam_id).await {
        Ok(exam) => exam,
        Err(e) => {
            error!("[考试 {}] ❌ 获取考试信息失败: {}", exam_id, e);
            return BootstrapOutcome::Failed(non_empty_or(e.user_message(), "Failed to load exam"));
        }
    };

    info!("▶️ [考试 {}] 开始作答...", exam_id);
    let attempt = match api.start_exam(exam_id).await {
        Ok(attempt) => attempt,
        Err(e) => {
            warn!("[考试 {}] ⚠️ 无法开始作答: {}", exam_id, e);
            return classify_start_failure(&e);
        }
    };

    let questions = match api.get_questions(exam_id).await {
        Ok(questions) => questions,
        // 后端正常应答但拒绝（success:false）时按空列表处理
        Err(e @ ApiError::Rejected { .. }) => {
            warn!("[考试 {}] ⚠️ 获取题目被拒绝，按空列表处理: {}", exam_id, e);
            Vec::new()
        }
        Err(e) => {
            error!("[考试 {}] ❌ 获取题目失败: {}", exam_id, e);
            return BootstrapOutcome::Failed(non_empty_or(e.user_message(), "Failed to load exam"));
        }
    };

    let remaining_secs = remaining_seconds(exam.duration_seconds(), attempt.started_at, clock.now());
    info!(
        "✓ [考试 {}] 作答 #{} 已就绪: {} 道题, 剩余 {}",
        exam_id,
        attempt.id,
        questions.len(),
        format_remaining(remaining_secs)
    );

    BootstrapOutcome::Ready(SessionSeed {
        exam,
        attempt,
        questions,
        remaining_secs,
    })
}

/// 判断开始作答失败属于"被阻止"还是普通错误
///
/// 消息中包含 `max attempts` / `đã làm`，或状态码为 403 时视为被阻止。
pub fn classify_start_failure(err: &ApiError) -> BootstrapOutcome {
    let raw = err.user_message();
    let lowered = raw.to_lowercase();

    if lowered.contains("max attempts") || lowered.contains("đã làm") {
        return BootstrapOutcome::Blocked(BlockedReason {
            message: MAX_ATTEMPTS_MESSAGE.to_string(),
            quota: parse_quota(&raw),
        });
    }

    if err.is_forbidden() {
        let message = if raw.trim().is_empty() {
            FORBIDDEN_MESSAGE.to_string()
        } else {
            format!("{} {}", FORBIDDEN_MESSAGE, raw.trim())
        };
        return BootstrapOutcome::Blocked(BlockedReason {
            message,
            quota: None,
        });
    }

    BootstrapOutcome::Failed(non_empty_or(raw, "Failed to start exam"))
}

/// 从 "You have completed 2/3 attempts." 中解析次数
fn parse_quota(message: &str) -> Option<AttemptQuota> {
    static QUOTA_RE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = QUOTA_RE
        .get_or_init(|| Regex::new(r"(?i)completed\s+(\d+)\s*/\s*(\d+)").ok())
        .as_ref()?;
    let caps = re.captures(message)?;
    Some(AttemptQuota {
        completed: caps.get(1)?.as_str().parse().ok()?,
        max: caps.get(2)?.as_str().parse().ok()?,
    })
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
