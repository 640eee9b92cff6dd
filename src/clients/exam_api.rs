//! 考试接口抽象
//!
//! 会话状态机只依赖这个 trait，测试时可以替换为内存实现。

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::{Attempt, Exam, ExamId, ExamResult, SessionQuestion, SubmitExamRequest};

#[async_trait]
pub trait ExamApi: Send + Sync {
    /// `GET /exam/{id}`
    async fn get_exam(&self, exam_id: ExamId) -> Result<Exam, ApiError>;

    /// `POST /exam/{id}/start`，开始或继续一次作答
    async fn start_exam(&self, exam_id: ExamId) -> Result<Attempt, ApiError>;

    /// `GET /exam/{id}/questions`，已归一化为会话题目
    async fn get_questions(&self, exam_id: ExamId) -> Result<Vec<SessionQuestion>, ApiError>;

    /// `POST /exam/{id}/submit`
    async fn submit_exam(
        &self,
        exam_id: ExamId,
        request: &SubmitExamRequest,
    ) -> Result<ExamResult, ApiError>;

    /// `GET /exam/{id}/attempts`
    async fn get_my_attempts(&self, exam_id: ExamId) -> Result<Vec<Attempt>, ApiError>;
}
