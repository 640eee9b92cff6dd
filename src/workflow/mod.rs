pub mod answer_sheet;
pub mod bootstrap;
pub mod exam_session;
pub mod navigator;
pub mod timer;

pub use answer_sheet::AnswerSheet;
pub use bootstrap::{load_session, AttemptQuota, BlockedReason, BootstrapOutcome, SessionSeed};
pub use exam_session::{
    confirmation_message, ExamSession, OptionChoice, SessionState, SubmitDecision, TickEvent,
};
pub use navigator::Navigator;
pub use timer::{format_remaining, Countdown};
