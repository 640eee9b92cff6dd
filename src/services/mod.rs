pub mod attempt_history;
pub mod presenter;

pub use attempt_history::{AttemptHistory, AttemptLine};
pub use presenter::{render, ResultSummary, SessionSnapshot};
