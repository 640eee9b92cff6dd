use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub type ExamId = i64;
pub type AttemptId = i64;

/// 未设置考试时长时的默认值（分钟）
pub const DEFAULT_DURATION_MINUTES: u32 = 60;
/// 未设置及格线时的默认值（百分比）
pub const DEFAULT_PASS_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExamStatus {
    Draft,
    Inactive,
    Active,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    InProgress,
    Submitted,
    Completed,
    Graded,
    Expired,
    #[serde(other)]
    Unknown,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "IN_PROGRESS",
            AttemptStatus::Submitted => "SUBMITTED",
            AttemptStatus::Completed => "COMPLETED",
            AttemptStatus::Graded => "GRADED",
            AttemptStatus::Expired => "EXPIRED",
            AttemptStatus::Unknown => "UNKNOWN",
        }
    }
}

/// 考试元数据（只读快照）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: ExamId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub pass_threshold: Option<f64>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub total_questions: Option<u32>,
    #[serde(default)]
    pub total_points: Option<f64>,
    #[serde(default)]
    pub status: Option<ExamStatus>,
    #[serde(default)]
    pub show_results_immediately: Option<bool>,
    #[serde(default)]
    pub show_correct_answers: Option<bool>,
    #[serde(default)]
    pub randomize_questions: Option<bool>,
    #[serde(default)]
    pub randomize_answers: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub end_time: Option<DateTime<Utc>>,
}

impl Exam {
    /// 标题，缺省显示 "Exam"
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("Exam")
    }

    /// 考试总时长（秒）
    pub fn duration_seconds(&self) -> u64 {
        let minutes = match self.duration_minutes {
            Some(m) if m > 0 => m,
            _ => DEFAULT_DURATION_MINUTES,
        };
        u64::from(minutes) * 60
    }

    /// 及格线（百分比）
    pub fn pass_threshold_or_default(&self) -> f64 {
        self.pass_threshold.unwrap_or(DEFAULT_PASS_THRESHOLD)
    }
}

/// 一次作答记录
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: AttemptId,
    #[serde(default)]
    pub exam_id: Option<ExamId>,
    #[serde(default)]
    pub attempt_number: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_spent_seconds: Option<u64>,
    #[serde(default)]
    pub total_score: Option<f64>,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub score_percentage: Option<f64>,
    #[serde(default)]
    pub status: Option<AttemptStatus>,
}

/// 解析时间戳
///
/// 支持带时区的 RFC 3339 和不带时区的本地格式（按 UTC 处理），
/// 无法识别时返回 None 而不是让整个响应解析失败。
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_exam_defaults() {
        let exam: Exam = serde_json::from_str(r#"{"id": 3, "title": null}"#).unwrap();
        assert_eq!(exam.display_title(), "Exam");
        assert_eq!(exam.duration_seconds(), 3600);
        assert_eq!(exam.pass_threshold_or_default(), 50.0);
    }

    #[test]
    fn test_exam_from_backend_json() {
        let exam: Exam = serde_json::from_str(
            r#"{
                "id": 12,
                "title": "Hóa học 10 - Chương 1",
                "durationMinutes": 45,
                "passThreshold": 65.5,
                "maxAttempts": 2,
                "status": "ACTIVE",
                "randomizeQuestions": true,
                "startTime": "2025-03-01T08:00:00+07:00"
            }"#,
        )
        .unwrap();

        assert_eq!(exam.duration_seconds(), 45 * 60);
        assert_eq!(exam.pass_threshold_or_default(), 65.5);
        assert_eq!(exam.status, Some(ExamStatus::Active));
        assert_eq!(
            exam.start_time,
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 1, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_unknown_status_is_tolerated() {
        let exam: Exam = serde_json::from_str(r#"{"id": 1, "status": "ARCHIVED"}"#).unwrap();
        assert_eq!(exam.status, Some(ExamStatus::Unknown));
    }

    #[test]
    fn test_attempt_started_at_formats() {
        let attempt: Attempt =
            serde_json::from_str(r#"{"id": 1, "startedAt": "2025-03-01T10:00:00.123456Z", "status": "IN_PROGRESS"}"#)
                .unwrap();
        assert!(attempt.started_at.is_some());
        assert_eq!(attempt.status, Some(AttemptStatus::InProgress));

        let naive: Attempt = serde_json::from_str(r#"{"id": 1, "startedAt": "2025-03-01T10:00:00"}"#).unwrap();
        assert_eq!(
            naive.started_at,
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap())
        );

        let garbage: Attempt = serde_json::from_str(r#"{"id": 1, "startedAt": "yesterday"}"#).unwrap();
        assert!(garbage.started_at.is_none());
    }
}
