//! 会话运行器 - 编排层
//!
//! ## 职责
//!
//! 唯一的事件循环，用 `tokio::select!` 同时等待：
//!
//! 1. **倒计时节拍**：每个节拍调用 `ExamSession::tick`
//! 2. **用户命令**：翻页、作答、标记、交卷、确认、离开
//! 3. **进行中的交卷请求**：最多一个，完成后回写会话
//!
//! 会话由循环独占，因此不需要锁。离开（或命令通道关闭）时直接退出，
//! 节拍器和未完成的请求随之丢弃，迟到的响应不会再被应用。

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::clients::ExamApi;
use crate::error::{ApiError, SessionError};
use crate::models::{ExamResult, SubmitExamRequest};
use crate::services::presenter::{ResultSummary, SessionSnapshot};
use crate::workflow::exam_session::{
    ExamSession, OptionChoice, SessionState, SubmitDecision, TickEvent,
};

/// 默认节拍间隔
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
/// 默认紧急阈值（秒）
pub const DEFAULT_URGENT_THRESHOLD_SECS: u64 = 300;

/// 用户命令
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Next,
    Previous,
    /// 从 0 开始的题目索引
    GoTo(usize),
    Answer(OptionChoice),
    ToggleFlag,
    Submit,
    Confirm,
    Cancel,
    Leave,
}

/// 运行器发出的事件
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// 画面需要刷新
    Updated(SessionSnapshot),
    Tick { remaining: u64, urgent: bool },
    ConfirmationRequired { unanswered: usize, message: String },
    SubmissionStarted { answered: usize, automatic: bool },
    Submitted { result: ExamResult, summary: ResultSummary },
    SubmitFailed { message: String },
    Rejected(SessionError),
    Closed,
}

type Submission = BoxFuture<'static, Result<ExamResult, ApiError>>;

enum Step {
    Tick,
    Command(Option<SessionCommand>),
    Finished(Result<ExamResult, ApiError>),
}

/// 会话运行器
pub struct SessionRunner<A: ExamApi + 'static> {
    api: Arc<A>,
    session: ExamSession,
    tick_interval: Duration,
    urgent_threshold_secs: u64,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl<A: ExamApi + 'static> SessionRunner<A> {
    pub fn new(
        api: Arc<A>,
        session: ExamSession,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            api,
            session,
            tick_interval: DEFAULT_TICK_INTERVAL,
            urgent_threshold_secs: DEFAULT_URGENT_THRESHOLD_SECS,
            events,
        }
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.tick_interval = interval;
        }
        self
    }

    pub fn with_urgent_threshold(mut self, secs: u64) -> Self {
        self.urgent_threshold_secs = secs;
        self
    }

    /// 运行到交卷完成、离开或命令通道关闭，返回最终的会话
    pub async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) -> ExamSession {
        let exam_id = self.session.exam_id();
        if self.session.state().is_terminal() {
            debug!("[考试 {}] 会话已结束 ({})，不进入循环", exam_id, self.session.state().name());
            self.emit(SessionEvent::Closed);
            return self.session;
        }

        let mut ticker = time::interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight: Option<Submission> = None;

        info!("🕒 [考试 {}] 会话开始计时", exam_id);
        self.emit_snapshot();

        loop {
            let timer_running = self.session.is_timer_running();
            let step = tokio::select! {
                _ = ticker.tick(), if timer_running => Step::Tick,
                command = commands.recv() => Step::Command(command),
                outcome = wait_submission(&mut in_flight) => Step::Finished(outcome),
            };

            match step {
                Step::Tick => {
                    if let Some(request) = self.on_tick() {
                        in_flight = Some(self.dispatch(request, true));
                    }
                }
                Step::Command(None) | Step::Command(Some(SessionCommand::Leave)) => {
                    if in_flight.is_some() {
                        warn!("[考试 {}] 离开时交卷请求仍未返回，结果将被丢弃", exam_id);
                    }
                    info!("👋 [考试 {}] 离开会话", exam_id);
                    break;
                }
                Step::Command(Some(command)) => {
                    if let Some(request) = self.on_command(command) {
                        in_flight = Some(self.dispatch(request, false));
                    }
                }
                Step::Finished(outcome) => {
                    self.on_finished(outcome);
                    if self.session.state().is_terminal() {
                        break;
                    }
                }
            }
        }

        self.emit(SessionEvent::Closed);
        self.session
    }

    fn on_tick(&mut self) -> Option<SubmitExamRequest> {
        match self.session.tick() {
            TickEvent::Running { remaining } => {
                self.emit(SessionEvent::Tick {
                    remaining,
                    urgent: self.session.is_urgent(self.urgent_threshold_secs),
                });
                None
            }
            TickEvent::AutoSubmit(request) => {
                self.emit(SessionEvent::Tick {
                    remaining: 0,
                    urgent: true,
                });
                Some(request)
            }
            TickEvent::Expired => {
                debug!("[考试 {}] 时间到，但交卷已在进行中", self.session.exam_id());
                None
            }
            TickEvent::Idle => None,
        }
    }

    fn on_command(&mut self, command: SessionCommand) -> Option<SubmitExamRequest> {
        debug!("[考试 {}] 命令: {:?}", self.session.exam_id(), command);
        let applied = match command {
            SessionCommand::Next => self.session.next().map(|_| ()),
            SessionCommand::Previous => self.session.previous().map(|_| ()),
            SessionCommand::GoTo(index) => self.session.go_to(index).map(|_| ()),
            SessionCommand::Answer(choice) => self.session.select_current(choice).map(|_| ()),
            SessionCommand::ToggleFlag => self.session.toggle_current_flag().map(|_| ()),
            SessionCommand::Cancel => {
                self.session.cancel_submit();
                Ok(())
            }
            SessionCommand::Submit => {
                return match self.session.request_submit() {
                    SubmitDecision::NeedsConfirmation {
                        unanswered,
                        message,
                    } => {
                        self.emit(SessionEvent::ConfirmationRequired {
                            unanswered,
                            message,
                        });
                        None
                    }
                    SubmitDecision::Proceed(request) => Some(request),
                    SubmitDecision::Ignored => None,
                };
            }
            SessionCommand::Confirm => return self.session.confirm_submit(),
            SessionCommand::Leave => Ok(()),
        };

        match applied {
            Ok(()) => self.emit_snapshot(),
            Err(e) => self.emit(SessionEvent::Rejected(e)),
        }
        None
    }

    fn on_finished(&mut self, outcome: Result<ExamResult, ApiError>) {
        if !self.session.finish_submit(outcome) {
            return;
        }
        match self.session.state() {
            SessionState::Submitted { result } => {
                let summary = ResultSummary::from_result(
                    result,
                    self.session.exam(),
                    self.session.questions().len(),
                );
                crate::utils::logging::log_submitted(summary.percent, summary.passed);
                self.emit(SessionEvent::Submitted {
                    result: result.clone(),
                    summary,
                });
            }
            _ => {
                let message = self.session.submit_error().unwrap_or_default().to_string();
                self.emit(SessionEvent::SubmitFailed { message });
                self.emit_snapshot();
            }
        }
    }

    /// 发出交卷请求（此时会话已处于 Submitting）
    fn dispatch(&self, request: SubmitExamRequest, automatic: bool) -> Submission {
        self.emit(SessionEvent::SubmissionStarted {
            answered: request.answers.len(),
            automatic,
        });
        let api = Arc::clone(&self.api);
        let exam_id = self.session.exam_id();
        async move { api.submit_exam(exam_id, &request).await }.boxed()
    }

    fn emit_snapshot(&self) {
        self.emit(SessionEvent::Updated(SessionSnapshot::capture(
            &self.session,
            self.urgent_threshold_secs,
        )));
    }

    fn emit(&self, event: SessionEvent) {
        // 接收端已关闭时忽略
        let _ = self.events.send(event);
    }
}

async fn wait_submission(in_flight: &mut Option<Submission>) -> Result<ExamResult, ApiError> {
    match in_flight.as_mut() {
        Some(submission) => {
            let outcome = submission.await;
            *in_flight = None;
            outcome
        }
        None => std::future::pending().await,
    }
}
