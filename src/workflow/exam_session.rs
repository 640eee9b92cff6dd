//! 考试会话状态机
//!
//! ```text
//! Loading -> {Blocked | Error | Ready}
//! Ready -> (倒计时到点 或 手动交卷) -> Submitting
//! Submitting -> Submitted | Ready (失败时保留错误信息)
//! ```
//!
//! 所有状态只存在于内存中。会话由运行层独占（`&mut`），因此不需要锁；
//! "谁先进入 Submitting 谁发请求"即可保证只交卷一次。

use tracing::{debug, info, warn};

use crate::clients::ExamApi;
use crate::error::{ApiError, SessionError};
use crate::models::{
    AnswerId, Attempt, Exam, ExamId, ExamResult, QuestionId, SessionQuestion, SubmitExamRequest,
};
use crate::utils::Clock;
use crate::workflow::answer_sheet::AnswerSheet;
use crate::workflow::bootstrap::{load_session, BlockedReason, BootstrapOutcome, SessionSeed};
use crate::workflow::navigator::Navigator;
use crate::workflow::timer::{Countdown, TickOutcome};

/// 交卷失败且后端没有给出原因时的提示
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to submit exam";

/// 会话状态
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Loading,
    Blocked(BlockedReason),
    Error { message: String },
    Ready,
    Submitting,
    Submitted { result: ExamResult },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Loading => "Loading",
            SessionState::Blocked(_) => "Blocked",
            SessionState::Error { .. } => "Error",
            SessionState::Ready => "Ready",
            SessionState::Submitting => "Submitting",
            SessionState::Submitted { .. } => "Submitted",
        }
    }

    /// Blocked / Error / Submitted 之后不会再变化
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Blocked(_) | SessionState::Error { .. } | SessionState::Submitted { .. }
        )
    }
}

/// 用户对当前题目的选择：字母（A/B/C…）或选项 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionChoice {
    Letter(char),
    Id(AnswerId),
}

impl OptionChoice {
    /// 解析 `"b"` / `"B"` / `"42"`
    pub fn parse(input: &str) -> Result<Self, SessionError> {
        let trimmed = input.trim();
        let mut chars = trimmed.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_alphabetic() {
                return Ok(OptionChoice::Letter(c.to_ascii_uppercase()));
            }
        }
        trimmed
            .parse::<AnswerId>()
            .map(OptionChoice::Id)
            .map_err(|_| SessionError::UnknownChoice {
                choice: trimmed.to_string(),
            })
    }
}

/// 请求交卷的结果
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitDecision {
    /// 有未作答题目，需要确认（尚未发出任何请求）
    NeedsConfirmation { unanswered: usize, message: String },
    /// 已进入 Submitting，调用方负责发送该请求
    Proceed(SubmitExamRequest),
    /// 当前状态不能交卷（例如已在交卷中）
    Ignored,
}

/// 一次节拍的结果
#[derive(Debug, Clone, PartialEq)]
pub enum TickEvent {
    Running { remaining: u64 },
    /// 时间到，已进入 Submitting，调用方负责发送该请求
    AutoSubmit(SubmitExamRequest),
    /// 时间到，但已经在交卷中
    Expired,
    /// 倒计时不在运行
    Idle,
}

/// 未作答确认提示
pub fn confirmation_message(unanswered: usize) -> String {
    format!(
        "You have {} unanswered question(s). Are you sure you want to submit?",
        unanswered
    )
}

/// 一次考试会话
#[derive(Debug, Clone)]
pub struct ExamSession {
    exam_id: ExamId,
    state: SessionState,
    started: bool,
    exam: Option<Exam>,
    attempt: Option<Attempt>,
    questions: Vec<SessionQuestion>,
    answers: AnswerSheet,
    navigator: Navigator,
    countdown: Countdown,
    pending_confirmation: Option<usize>,
    submit_error: Option<String>,
}

impl ExamSession {
    pub fn new(exam_id: ExamId) -> Self {
        Self {
            exam_id,
            state: SessionState::Loading,
            started: false,
            exam: None,
            attempt: None,
            questions: Vec::new(),
            answers: AnswerSheet::new(),
            navigator: Navigator::new(0),
            countdown: Countdown::new(0),
            pending_confirmation: None,
            submit_error: None,
        }
    }

    /// 直接用已加载的数据构造一个 Ready 会话
    pub fn from_seed(seed: SessionSeed) -> Self {
        let mut session = Self::new(seed.exam.id);
        session.started = true;
        session.apply_seed(seed);
        session
    }

    /// 启动会话（只执行一次，再次调用直接返回当前状态）
    pub async fn bootstrap<A>(&mut self, api: &A, clock: &Clock) -> &SessionState
    where
        A: ExamApi + ?Sized,
    {
        if self.started {
            debug!("[考试 {}] 会话已启动，忽略重复启动", self.exam_id);
            return &self.state;
        }
        self.started = true;

        match load_session(api, self.exam_id, clock).await {
            BootstrapOutcome::Ready(seed) => self.apply_seed(seed),
            BootstrapOutcome::Blocked(reason) => self.state = SessionState::Blocked(reason),
            BootstrapOutcome::Failed(message) => self.state = SessionState::Error { message },
        }
        &self.state
    }

    fn apply_seed(&mut self, seed: SessionSeed) {
        self.navigator = Navigator::new(seed.questions.len());
        self.countdown = Countdown::new(seed.remaining_secs);
        self.exam = Some(seed.exam);
        self.attempt = Some(seed.attempt);
        self.questions = seed.questions;
        self.state = SessionState::Ready;
    }

    pub fn exam_id(&self) -> ExamId {
        self.exam_id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn exam(&self) -> Option<&Exam> {
        self.exam.as_ref()
    }

    pub fn attempt(&self) -> Option<&Attempt> {
        self.attempt.as_ref()
    }

    pub fn questions(&self) -> &[SessionQuestion] {
        &self.questions
    }

    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    pub fn current_index(&self) -> usize {
        self.navigator.current()
    }

    pub fn current_question(&self) -> Option<&SessionQuestion> {
        self.questions.get(self.navigator.current())
    }

    pub fn remaining_secs(&self) -> u64 {
        self.countdown.remaining()
    }

    pub fn is_urgent(&self, threshold_secs: u64) -> bool {
        self.countdown.is_urgent(threshold_secs)
    }

    /// 倒计时是否还需要节拍
    pub fn is_timer_running(&self) -> bool {
        matches!(self.state, SessionState::Ready | SessionState::Submitting)
            && self.countdown.is_running()
    }

    /// 等待确认中的未作答题数
    pub fn pending_confirmation(&self) -> Option<usize> {
        self.pending_confirmation
    }

    /// 最近一次交卷失败的信息
    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    pub fn unanswered_count(&self) -> usize {
        self.answers.unanswered_count(&self.questions)
    }

    fn ensure_ready(&self, action: &'static str) -> Result<(), SessionError> {
        match self.state {
            SessionState::Ready => Ok(()),
            _ => Err(SessionError::InvalidState {
                action,
                state: self.state.name(),
            }),
        }
    }

    fn ensure_navigable(&self, action: &'static str) -> Result<(), SessionError> {
        match self.state {
            SessionState::Ready | SessionState::Submitting => Ok(()),
            _ => Err(SessionError::InvalidState {
                action,
                state: self.state.name(),
            }),
        }
    }

    /// 为指定题目选择选项
    pub fn select_answer(
        &mut self,
        question_id: QuestionId,
        answer_id: AnswerId,
    ) -> Result<(), SessionError> {
        self.ensure_ready("select_answer")?;
        let question = self
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or(SessionError::UnknownQuestion { question_id })?;
        if !question.has_option(answer_id) {
            return Err(SessionError::UnknownOption {
                question_id,
                answer_id,
            });
        }
        self.answers.select(question_id, answer_id);
        Ok(())
    }

    /// 为当前题目选择选项，返回实际选中的选项 ID
    pub fn select_current(&mut self, choice: OptionChoice) -> Result<AnswerId, SessionError> {
        self.ensure_ready("select_answer")?;
        let question = self
            .current_question()
            .ok_or(SessionError::IndexOutOfRange {
                index: self.navigator.current(),
                len: self.questions.len(),
            })?;
        let answer_id = match choice {
            OptionChoice::Letter(letter) => question
                .option_by_letter(letter)
                .map(|o| o.id)
                .ok_or_else(|| SessionError::UnknownChoice {
                    choice: letter.to_string(),
                })?,
            OptionChoice::Id(id) => id,
        };
        let question_id = question.id;
        self.select_answer(question_id, answer_id)?;
        Ok(answer_id)
    }

    /// 切换标记，返回切换后的标记状态
    pub fn toggle_flag(&mut self, question_id: QuestionId) -> Result<bool, SessionError> {
        self.ensure_ready("toggle_flag")?;
        if !self.questions.iter().any(|q| q.id == question_id) {
            return Err(SessionError::UnknownQuestion { question_id });
        }
        Ok(self.answers.toggle_flag(question_id))
    }

    pub fn toggle_current_flag(&mut self) -> Result<bool, SessionError> {
        let question_id = self
            .current_question()
            .map(|q| q.id)
            .ok_or(SessionError::IndexOutOfRange {
                index: self.navigator.current(),
                len: self.questions.len(),
            })?;
        self.toggle_flag(question_id)
    }

    pub fn go_to(&mut self, index: usize) -> Result<usize, SessionError> {
        self.ensure_navigable("go_to")?;
        self.navigator.go_to(index)
    }

    pub fn next(&mut self) -> Result<usize, SessionError> {
        self.ensure_navigable("next")?;
        Ok(self.navigator.next())
    }

    pub fn previous(&mut self) -> Result<usize, SessionError> {
        self.ensure_navigable("previous")?;
        Ok(self.navigator.previous())
    }

    /// 手动交卷
    ///
    /// 有未作答题目时只返回确认提示，不发请求；全部作答则直接进入 Submitting。
    pub fn request_submit(&mut self) -> SubmitDecision {
        if self.state != SessionState::Ready {
            debug!("[考试 {}] 当前状态 {} 忽略交卷请求", self.exam_id, self.state.name());
            return SubmitDecision::Ignored;
        }
        let unanswered = self.unanswered_count();
        if unanswered > 0 {
            self.pending_confirmation = Some(unanswered);
            return SubmitDecision::NeedsConfirmation {
                unanswered,
                message: confirmation_message(unanswered),
            };
        }
        match self.begin_submit() {
            Some(request) => SubmitDecision::Proceed(request),
            None => SubmitDecision::Ignored,
        }
    }

    /// 确认交卷（仅在有待确认提示时有效）
    pub fn confirm_submit(&mut self) -> Option<SubmitExamRequest> {
        self.pending_confirmation.take()?;
        self.begin_submit()
    }

    pub fn cancel_submit(&mut self) {
        self.pending_confirmation = None;
    }

    /// 倒计时走一拍；到点时自动交卷（跳过确认）
    pub fn tick(&mut self) -> TickEvent {
        if !self.is_timer_running() {
            return TickEvent::Idle;
        }
        match self.countdown.tick() {
            TickOutcome::Running { remaining } => TickEvent::Running { remaining },
            TickOutcome::Expired => {
                info!("⏰ [考试 {}] 时间到，自动交卷", self.exam_id);
                match self.begin_submit() {
                    Some(request) => TickEvent::AutoSubmit(request),
                    None => TickEvent::Expired,
                }
            }
            TickOutcome::Stopped => TickEvent::Idle,
        }
    }

    /// 进入 Submitting；已在交卷中或不在 Ready 时返回 None
    fn begin_submit(&mut self) -> Option<SubmitExamRequest> {
        if self.state != SessionState::Ready {
            return None;
        }
        self.pending_confirmation = None;
        self.submit_error = None;
        self.state = SessionState::Submitting;
        let request = self.answers.to_submission(&self.questions);
        info!(
            "📤 [考试 {}] 交卷: {}/{} 题已作答",
            self.exam_id,
            request.answers.len(),
            self.questions.len()
        );
        Some(request)
    }

    /// 应用交卷结果，不在 Submitting 时忽略并返回 false
    pub fn finish_submit(&mut self, outcome: Result<ExamResult, ApiError>) -> bool {
        if self.state != SessionState::Submitting {
            warn!(
                "[考试 {}] 状态 {} 下收到交卷结果，忽略",
                self.exam_id,
                self.state.name()
            );
            return false;
        }
        match outcome {
            Ok(result) => {
                self.countdown.stop();
                self.state = SessionState::Submitted { result };
                info!("✅ [考试 {}] 交卷成功", self.exam_id);
            }
            Err(e) => {
                warn!("[考试 {}] ❌ 交卷失败: {}", self.exam_id, e);
                let message = e.user_message();
                self.submit_error = Some(if message.trim().is_empty() {
                    SUBMIT_FAILED_MESSAGE.to_string()
                } else {
                    message
                });
                self.state = SessionState::Ready;
            }
        }
        true
    }

    /// 发送交卷请求并应用结果（无需并发调度时使用）
    pub async fn deliver<A>(&mut self, api: &A, request: SubmitExamRequest) -> &SessionState
    where
        A: ExamApi + ?Sized,
    {
        let outcome = api.submit_exam(self.exam_id, &request).await;
        self.finish_submit(outcome);
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnswerOption;

    fn question(id: QuestionId) -> SessionQuestion {
        SessionQuestion {
            id,
            text: format!("Q{}", id),
            options: (0..3)
                .map(|i| AnswerOption {
                    id: id * 10 + i,
                    text: format!("Option {}", i + 1),
                    order_index: Some(i as u32),
                })
                .collect(),
            points: Some(1.0),
            difficulty_level: None,
            question_type: None,
            order_index: None,
        }
    }

    fn ready_session(question_ids: &[QuestionId], remaining_secs: u64) -> ExamSession {
        ExamSession::from_seed(SessionSeed {
            exam: Exam {
                id: 7,
                title: Some("Hóa 10 - Chương 1".to_string()),
                ..Exam::default()
            },
            attempt: Attempt {
                id: 70,
                ..Attempt::default()
            },
            questions: question_ids.iter().copied().map(question).collect(),
            remaining_secs,
        })
    }

    #[test]
    fn test_option_choice_parse() {
        assert_eq!(OptionChoice::parse("b"), Ok(OptionChoice::Letter('B')));
        assert_eq!(OptionChoice::parse(" 42 "), Ok(OptionChoice::Id(42)));
        assert!(OptionChoice::parse("bb").is_err());
    }

    #[test]
    fn test_select_rejects_foreign_question_and_option() {
        let mut session = ready_session(&[1, 2], 600);
        assert_eq!(
            session.select_answer(9, 90),
            Err(SessionError::UnknownQuestion { question_id: 9 })
        );
        assert_eq!(
            session.select_answer(1, 20),
            Err(SessionError::UnknownOption {
                question_id: 1,
                answer_id: 20
            })
        );
        assert_eq!(session.answers().answered_count(), 0);
    }

    #[test]
    fn test_select_current_by_letter() {
        let mut session = ready_session(&[1, 2], 600);
        session.next().unwrap();
        assert_eq!(session.select_current(OptionChoice::Letter('C')), Ok(22));
        assert_eq!(session.answers().selected(2), Some(22));
        assert!(session.select_current(OptionChoice::Letter('Z')).is_err());
    }

    #[test]
    fn test_unanswered_requires_confirmation_before_any_request() {
        let mut session = ready_session(&[1, 2, 3], 600);
        session.select_answer(1, 10).unwrap();
        session.select_answer(3, 31).unwrap();

        match session.request_submit() {
            SubmitDecision::NeedsConfirmation { unanswered, message } => {
                assert_eq!(unanswered, 1);
                assert_eq!(
                    message,
                    "You have 1 unanswered question(s). Are you sure you want to submit?"
                );
            }
            other => panic!("期望确认提示，实际: {:?}", other),
        }
        assert_eq!(session.state(), &SessionState::Ready);

        let request = session.confirm_submit().unwrap();
        assert_eq!(request.answers.len(), 2);
        assert_eq!(request.answers[0].question_id, 1);
        assert_eq!(request.answers[1].question_id, 3);
        assert_eq!(session.state(), &SessionState::Submitting);
    }

    #[test]
    fn test_all_answered_submits_without_confirmation() {
        let mut session = ready_session(&[1], 600);
        session.select_answer(1, 11).unwrap();
        assert!(matches!(session.request_submit(), SubmitDecision::Proceed(_)));
    }

    #[test]
    fn test_cancel_clears_confirmation() {
        let mut session = ready_session(&[1], 600);
        session.request_submit();
        session.cancel_submit();
        assert_eq!(session.pending_confirmation(), None);
        assert_eq!(session.confirm_submit(), None);
        assert_eq!(session.state(), &SessionState::Ready);
    }

    #[test]
    fn test_guard_blocks_every_second_submit_path() {
        let mut session = ready_session(&[1], 1);
        session.select_answer(1, 10).unwrap();
        assert!(matches!(session.request_submit(), SubmitDecision::Proceed(_)));

        assert_eq!(session.request_submit(), SubmitDecision::Ignored);
        assert_eq!(session.confirm_submit(), None);
        assert_eq!(session.tick(), TickEvent::Expired);
    }

    #[test]
    fn test_expiry_auto_submits_and_clears_confirmation() {
        let mut session = ready_session(&[1, 2], 2);
        session.request_submit();
        assert!(session.pending_confirmation().is_some());

        assert_eq!(session.tick(), TickEvent::Running { remaining: 1 });
        assert!(matches!(session.tick(), TickEvent::AutoSubmit(_)));
        assert_eq!(session.pending_confirmation(), None);
        assert_eq!(session.tick(), TickEvent::Idle);
    }

    #[test]
    fn test_zero_remaining_auto_submits_on_first_tick() {
        let mut session = ready_session(&[1], 0);
        assert!(matches!(session.tick(), TickEvent::AutoSubmit(_)));
    }

    #[test]
    fn test_failed_submit_returns_to_ready_with_message() {
        let mut session = ready_session(&[1], 600);
        session.select_answer(1, 10).unwrap();
        session.request_submit();

        let err = ApiError::Rejected {
            endpoint: "/exam/7/submit".to_string(),
            status_code: Some(500),
            message: None,
        };
        assert!(session.finish_submit(Err(err)));
        assert_eq!(session.state(), &SessionState::Ready);
        assert_eq!(session.submit_error(), Some(SUBMIT_FAILED_MESSAGE));

        assert!(matches!(session.request_submit(), SubmitDecision::Proceed(_)));
        assert_eq!(session.submit_error(), None);
    }

    #[test]
    fn test_success_is_terminal_and_late_results_are_ignored() {
        let mut session = ready_session(&[1], 600);
        session.select_answer(1, 10).unwrap();
        session.request_submit();
        assert!(session.finish_submit(Ok(ExamResult::default())));
        assert!(session.state().is_terminal());
        assert!(!session.is_timer_running());

        assert!(!session.finish_submit(Ok(ExamResult::default())));
        assert!(session.select_answer(1, 11).is_err());
        assert!(session.next().is_err());
    }

    #[test]
    fn test_navigation_allowed_while_submitting_but_not_answers() {
        let mut session = ready_session(&[1, 2], 600);
        session.select_answer(1, 10).unwrap();
        session.select_answer(2, 20).unwrap();
        session.request_submit();

        assert_eq!(session.next(), Ok(1));
        assert!(matches!(
            session.toggle_current_flag(),
            Err(SessionError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_flag_does_not_count_as_answer() {
        let mut session = ready_session(&[1, 2], 600);
        assert_eq!(session.toggle_current_flag(), Ok(true));
        assert_eq!(session.unanswered_count(), 2);
        assert_eq!(session.toggle_flag(1), Ok(false));
    }
}
