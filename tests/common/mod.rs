//! 测试用的内存版考试接口

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value as JsonValue};

use take_exam::models::{
    Attempt, Exam, ExamId, ExamResult, QuestionsPayload, SessionQuestion, SubmitExamRequest,
};
use take_exam::{ApiError, ExamApi};

/// 后端拒绝：`(statusCode, message)`
pub type Rejection = (Option<u16>, String);

#[derive(Debug, Clone)]
pub enum QuestionsFailure {
    /// 2xx 信封，success:false
    Rejected(Rejection),
    /// 非 2xx 且响应体不是信封（网关错误等）
    BadStatus(u16),
}

pub struct FakeExamApi {
    pub exam: Result<Exam, Rejection>,
    pub attempt: Result<Attempt, Rejection>,
    /// 原样交给题目归一化的 `data`
    pub questions_payload: JsonValue,
    /// 题目接口失败方式，None 表示正常返回
    pub questions_failure: Option<QuestionsFailure>,
    /// 按顺序消费，用完后返回默认结果
    pub submit_outcomes: Mutex<VecDeque<Result<ExamResult, Rejection>>>,
    pub submit_delay: Option<Duration>,
    pub attempts: Result<Vec<Attempt>, Rejection>,

    pub exam_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub question_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub submitted: Mutex<Vec<SubmitExamRequest>>,
}

pub fn started_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 10, 7, 0, 0).unwrap()
}

/// 三道题的常规考试，每题两个选项（id = 题号 * 10 + 0/1）
pub fn chemistry_questions_payload() -> JsonValue {
    json!([
        {"id": 1, "content": "Nguyên tố nào có Z = 1?",
         "options": [{"id": 10, "answerText": "H"}, {"id": 11, "answerText": "He"}]},
        {"id": 2, "content": "Công thức của nước?",
         "options": [{"id": 20, "answerText": "H2O"}, {"id": 21, "answerText": "CO2"}]},
        {"id": 3, "content": "Khí nào duy trì sự cháy?",
         "options": [{"id": 30, "answerText": "O2"}, {"id": 31, "answerText": "N2"}]}
    ])
}

impl FakeExamApi {
    pub fn new(duration_minutes: u32) -> Self {
        Self {
            exam: Ok(Exam {
                id: 5,
                title: Some("Kiểm tra Hóa học 10".to_string()),
                duration_minutes: Some(duration_minutes),
                pass_threshold: Some(50.0),
                ..Exam::default()
            }),
            attempt: Ok(Attempt {
                id: 50,
                exam_id: Some(5),
                attempt_number: Some(1),
                started_at: Some(started_at()),
                ..Attempt::default()
            }),
            questions_payload: chemistry_questions_payload(),
            questions_failure: None,
            submit_outcomes: Mutex::new(VecDeque::new()),
            submit_delay: None,
            attempts: Ok(Vec::new()),
            exam_calls: AtomicUsize::new(0),
            start_calls: AtomicUsize::new(0),
            question_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_start_rejection(mut self, status_code: Option<u16>, message: &str) -> Self {
        self.attempt = Err((status_code, message.to_string()));
        self
    }

    pub fn with_questions(mut self, payload: JsonValue) -> Self {
        self.questions_payload = payload;
        self
    }

    pub fn with_questions_failure(mut self, failure: QuestionsFailure) -> Self {
        self.questions_failure = Some(failure);
        self
    }

    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = Some(delay);
        self
    }

    pub fn push_submit_outcome(&self, outcome: Result<ExamResult, Rejection>) {
        self.submit_outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

fn reject(endpoint: String, (status_code, message): &Rejection) -> ApiError {
    ApiError::rejected(endpoint, *status_code, message.clone())
}

#[async_trait]
impl ExamApi for FakeExamApi {
    async fn get_exam(&self, exam_id: ExamId) -> Result<Exam, ApiError> {
        self.exam_calls.fetch_add(1, Ordering::SeqCst);
        self.exam
            .clone()
            .map_err(|r| reject(format!("/exam/{}", exam_id), &r))
    }

    async fn start_exam(&self, exam_id: ExamId) -> Result<Attempt, ApiError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        self.attempt
            .clone()
            .map_err(|r| reject(format!("/exam/{}/start", exam_id), &r))
    }

    async fn get_questions(&self, exam_id: ExamId) -> Result<Vec<SessionQuestion>, ApiError> {
        self.question_calls.fetch_add(1, Ordering::SeqCst);
        let endpoint = format!("/exam/{}/questions", exam_id);
        match &self.questions_failure {
            Some(QuestionsFailure::Rejected(r)) => return Err(reject(endpoint, r)),
            Some(QuestionsFailure::BadStatus(status)) => {
                return Err(ApiError::BadStatus {
                    endpoint,
                    status: *status,
                })
            }
            None => {}
        }
        let payload: QuestionsPayload = serde_json::from_value(self.questions_payload.clone())
            .map_err(|source| ApiError::JsonParseFailed {
                endpoint,
                source,
            })?;
        Ok(payload.into_questions())
    }

    async fn submit_exam(
        &self,
        exam_id: ExamId,
        request: &SubmitExamRequest,
    ) -> Result<ExamResult, ApiError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(request.clone());
        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }
        let outcome = self.submit_outcomes.lock().unwrap().pop_front();
        match outcome {
            Some(Ok(result)) => Ok(result),
            Some(Err(r)) => Err(reject(format!("/exam/{}/submit", exam_id), &r)),
            None => Ok(ExamResult {
                score_percentage: Some(100.0),
                total_questions: Some(request.answers.len() as u32),
                ..ExamResult::default()
            }),
        }
    }

    async fn get_my_attempts(&self, exam_id: ExamId) -> Result<Vec<Attempt>, ApiError> {
        self.attempts
            .clone()
            .map_err(|r| reject(format!("/exam/{}/attempts", exam_id), &r))
    }
}
