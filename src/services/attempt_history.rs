//! 作答历史 - 业务能力层
//!
//! 只负责"列出我的作答记录"，与进行中的会话无关

use std::fmt;

use tracing::{debug, info};

use crate::clients::ExamApi;
use crate::error::AppResult;
use crate::models::{Attempt, ExamId};

/// 作答历史查询
pub struct AttemptHistory<'a, A: ExamApi + ?Sized> {
    api: &'a A,
}

impl<'a, A: ExamApi + ?Sized> AttemptHistory<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// 获取某场考试的作答记录，按作答序号排序
    pub async fn list(&self, exam_id: ExamId) -> AppResult<Vec<AttemptLine>> {
        debug!("查询作答历史: 考试 {}", exam_id);
        let mut attempts = self.api.get_my_attempts(exam_id).await?;
        attempts.sort_by_key(|a| (a.attempt_number.unwrap_or(u32::MAX), a.id));
        info!("📜 考试 {} 共 {} 条作答记录", exam_id, attempts.len());
        Ok(attempts.into_iter().map(AttemptLine).collect())
    }
}

/// 一条作答记录的显示行
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptLine(pub Attempt);

impl fmt::Display for AttemptLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = &self.0;
        let number = a
            .attempt_number
            .map(|n| format!("#{}", n))
            .unwrap_or_else(|| format!("id {}", a.id));
        let status = a.status.map(|s| s.as_str()).unwrap_or("UNKNOWN");
        let started = a
            .started_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let submitted = a
            .submitted_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let score = match (a.score_percentage, a.total_score, a.max_score) {
            (Some(pct), Some(total), Some(max)) => format!("{:.1}% ({} / {})", pct, total, max),
            (Some(pct), _, _) => format!("{:.1}%", pct),
            _ => "-".to_string(),
        };
        write!(
            f,
            "Attempt {:<6} {:<12} started {}  submitted {}  score {}",
            number, status, started, submitted, score
        )
    }
}
