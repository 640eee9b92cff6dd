pub mod envelope;
pub mod exam;
pub mod question;
pub mod submission;

pub use envelope::{unwrap_envelope, ApiEnvelope};
pub use exam::{Attempt, AttemptId, AttemptStatus, Exam, ExamId, ExamStatus};
pub use question::{
    option_letter, AnswerId, AnswerOption, QuestionId, QuestionsPayload, SessionQuestion,
};
pub use submission::{AnswerSubmission, ExamResult, SubmitExamRequest};
