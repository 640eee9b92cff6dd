//! 进度与结果渲染 - 业务能力层
//!
//! 只读取会话状态生成文本视图，不修改任何状态。

use std::fmt;

use crate::models::{option_letter, Exam, ExamResult};
use crate::workflow::exam_session::{ExamSession, SessionState};
use crate::workflow::timer::format_remaining;

/// 顶栏
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderView {
    pub title: String,
    /// 从 1 开始
    pub position: usize,
    pub total: usize,
    pub timer: String,
    pub urgent: bool,
}

/// 选项
#[derive(Debug, Clone, PartialEq)]
pub struct OptionView {
    /// 字母标签；超过 Z 的选项显示为 `#<选项 ID>`
    pub label: String,
    pub text: String,
    pub selected: bool,
}

/// 当前题目
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionView {
    pub number: usize,
    pub text: String,
    pub points: Option<f64>,
    pub options: Vec<OptionView>,
    pub flagged: bool,
}

/// 题号导航格
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigatorCell {
    pub number: usize,
    pub answered: bool,
    pub flagged: bool,
    pub current: bool,
}

impl fmt::Display for NavigatorCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = match (self.answered, self.flagged) {
            (_, true) => '!',
            (true, false) => '*',
            (false, false) => ' ',
        };
        if self.current {
            write!(f, "[{:>2}{}]", self.number, mark)
        } else {
            write!(f, " {:>2}{} ", self.number, mark)
        }
    }
}

/// 作答中的完整画面
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub header: HeaderView,
    pub question: Option<QuestionView>,
    pub cells: Vec<NavigatorCell>,
    pub answered: usize,
    pub total: usize,
    pub submitting: bool,
    pub confirmation: Option<String>,
    pub submit_error: Option<String>,
}

impl SessionSnapshot {
    pub fn capture(session: &ExamSession, urgent_threshold_secs: u64) -> Self {
        let questions = session.questions();
        let answers = session.answers();
        let current = session.current_index();
        let total = questions.len();

        let header = HeaderView {
            title: session
                .exam()
                .map(|e| e.display_title().to_string())
                .unwrap_or_else(|| "Exam".to_string()),
            position: if total == 0 { 0 } else { current + 1 },
            total,
            timer: format_remaining(session.remaining_secs()),
            urgent: session.is_urgent(urgent_threshold_secs),
        };

        let question = session.current_question().map(|q| {
            let selected = answers.selected(q.id);
            QuestionView {
                number: current + 1,
                text: q.text.clone(),
                points: q.points,
                options: q
                    .options
                    .iter()
                    .enumerate()
                    .map(|(i, o)| OptionView {
                        label: option_letter(i)
                            .map(String::from)
                            .unwrap_or_else(|| format!("#{}", o.id)),
                        text: o.text.clone(),
                        selected: selected == Some(o.id),
                    })
                    .collect(),
                flagged: answers.is_flagged(q.id),
            }
        });

        let cells = questions
            .iter()
            .enumerate()
            .map(|(i, q)| NavigatorCell {
                number: i + 1,
                answered: answers.is_answered(q.id),
                flagged: answers.is_flagged(q.id),
                current: i == current,
            })
            .collect();

        Self {
            header,
            question,
            cells,
            answered: total - answers.unanswered_count(questions),
            total,
            submitting: matches!(session.state(), SessionState::Submitting),
            confirmation: session
                .pending_confirmation()
                .map(crate::workflow::confirmation_message),
            submit_error: session.submit_error().map(str::to_string),
        }
    }
}

impl fmt::Display for SessionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = &self.header;
        let timer = if h.urgent {
            format!("⏰ {} (!)", h.timer)
        } else {
            format!("⏱ {}", h.timer)
        };
        writeln!(f, "{}  |  Question {} of {}  |  {}", h.title, h.position, h.total, timer)?;
        writeln!(f, "{}", "─".repeat(60))?;

        match &self.question {
            Some(q) => {
                let points = q
                    .points
                    .map(|p| format!(" ({} pts)", p))
                    .unwrap_or_default();
                let flag = if q.flagged { " 🚩" } else { "" };
                writeln!(f, "Question {}{}{}", q.number, points, flag)?;
                writeln!(f, "{}", q.text)?;
                for option in &q.options {
                    let marker = if option.selected { "(•)" } else { "( )" };
                    writeln!(f, "  {} {}. {}", marker, option.label, option.text)?;
                }
            }
            None => writeln!(f, "No questions available for this exam.")?,
        }

        writeln!(f, "{}", "─".repeat(60))?;
        let grid: String = self.cells.iter().map(|c| c.to_string()).collect();
        writeln!(f, "{}", grid)?;
        writeln!(f, "Answered: {} / {}", self.answered, self.total)?;

        if self.submitting {
            writeln!(f, "Submitting...")?;
        }
        if let Some(error) = &self.submit_error {
            writeln!(f, "❌ {}", error)?;
        }
        if let Some(confirmation) = &self.confirmation {
            writeln!(f, "{} [y/c]", confirmation)?;
        }
        Ok(())
    }
}

/// 交卷结果（带显示回退值）
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub percent: f64,
    pub total_score: f64,
    pub max_score: f64,
    pub total_questions: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub passed: bool,
}

impl ResultSummary {
    /// 后端字段缺失时按题目数量和及格线推算
    pub fn from_result(result: &ExamResult, exam: Option<&Exam>, question_count: usize) -> Self {
        let percent = result.score_percentage.or(result.score).unwrap_or(0.0);
        let question_count = u32::try_from(question_count).unwrap_or(u32::MAX);
        let max_score = result
            .max_score
            .or_else(|| exam.and_then(|e| e.total_points))
            .unwrap_or(f64::from(question_count));
        let total_questions = result.total_questions.unwrap_or(question_count);
        let correct = result
            .correct_count
            .or(result.correct)
            .unwrap_or_else(|| (percent / 100.0 * f64::from(total_questions)).round() as u32);
        let incorrect = result
            .incorrect_count
            .unwrap_or_else(|| total_questions.saturating_sub(correct));
        let threshold = exam
            .map(Exam::pass_threshold_or_default)
            .unwrap_or(crate::models::exam::DEFAULT_PASS_THRESHOLD);

        Self {
            percent,
            total_score: result.total_score.unwrap_or(0.0),
            max_score,
            total_questions,
            correct,
            incorrect,
            passed: percent >= threshold,
        }
    }
}

impl fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Exam Submitted!")?;
        writeln!(f, "{:.1}%", self.percent)?;
        writeln!(f, "({} / {} points)", self.total_score, self.max_score)?;
        writeln!(
            f,
            "{}",
            if self.passed { "✓ Passed!" } else { "✗ Not Passed" }
        )?;
        writeln!(f, "Total Questions: {}", self.total_questions)?;
        writeln!(f, "Correct: {}", self.correct)?;
        write!(f, "Incorrect: {}", self.incorrect)
    }
}

/// 按状态渲染整个画面
pub fn render(session: &ExamSession, urgent_threshold_secs: u64) -> String {
    match session.state() {
        SessionState::Loading => "Loading exam...".to_string(),
        SessionState::Blocked(reason) => blocked_view(&reason.message),
        SessionState::Error { message } => error_view(message),
        SessionState::Ready | SessionState::Submitting => {
            SessionSnapshot::capture(session, urgent_threshold_secs).to_string()
        }
        SessionState::Submitted { result } => {
            ResultSummary::from_result(result, session.exam(), session.questions().len())
                .to_string()
        }
    }
}

pub fn blocked_view(message: &str) -> String {
    format!("🚫 Cannot Start Exam\n{}\n[Back to Exams]", message)
}

pub fn error_view(message: &str) -> String {
    format!("❌ Error\n{}\n[Back to Exams]", message)
}
