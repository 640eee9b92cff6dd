use serde::{Deserialize, Serialize};

use super::exam::AttemptStatus;
use super::question::{AnswerId, QuestionId};

/// 单题作答
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub question_id: QuestionId,
    pub selected_answer_id: AnswerId,
}

/// `POST /exam/{id}/submit` 请求体
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitExamRequest {
    pub answers: Vec<AnswerSubmission>,
}

/// 交卷结果（由后端评分，客户端只读）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub attempt_number: Option<u32>,
    #[serde(default)]
    pub score_percentage: Option<f64>,
    /// 旧版接口使用的分数字段
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub total_score: Option<f64>,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default)]
    pub correct_count: Option<u32>,
    /// 旧版接口使用的正确数字段
    #[serde(default)]
    pub correct: Option<u32>,
    #[serde(default)]
    pub incorrect_count: Option<u32>,
    #[serde(default)]
    pub total_questions: Option<u32>,
    #[serde(default)]
    pub status: Option<AttemptStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_body_shape() {
        let request = SubmitExamRequest {
            answers: vec![AnswerSubmission {
                question_id: 1,
                selected_answer_id: 10,
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"answers": [{"questionId": 1, "selectedAnswerId": 10}]})
        );
    }

    #[test]
    fn test_result_from_backend() {
        let result: ExamResult = serde_json::from_str(
            r#"{"id": 4, "scorePercentage": 80.0, "totalScore": 8, "maxScore": 10,
                "correctCount": 4, "incorrectCount": 1, "totalQuestions": 5, "status": "COMPLETED"}"#,
        )
        .unwrap();
        assert_eq!(result.score_percentage, Some(80.0));
        assert_eq!(result.correct_count, Some(4));
        assert_eq!(result.status, Some(AttemptStatus::Completed));
    }
}
