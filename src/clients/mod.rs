pub mod auth;
pub mod exam_api;
pub mod exam_client;

pub use auth::AuthSession;
pub use exam_api::ExamApi;
pub use exam_client::ExamClient;
