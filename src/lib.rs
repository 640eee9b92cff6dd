//! # Take Exam
//!
//! 化学课程系统的考试作答客户端
//!
//! ## 架构设计
//!
//! ### ① 接口层（Clients）
//! - `clients/` - 带令牌的 REST 调用，统一解包 `{success, data, message, statusCode}`
//! - `ExamApi` - 会话只依赖这个 trait
//! - `ExamClient` - 基于 reqwest 的实现
//!
//! ### ② 流程层（Workflow）
//! - `workflow/` - 一次作答的完整状态
//! - `bootstrap` - 考试信息 → 开始作答 → 题目
//! - `ExamSession` - 状态机（作答、标记、导航、交卷）
//! - `Countdown` - 倒计时
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 只读的进度/结果渲染、作答历史
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session_runner` - 事件循环
//! - `orchestrator/app` - 终端应用
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{AuthSession, ExamApi, ExamClient};
pub use config::Config;
pub use error::{ApiError, AppError, AppResult, SessionError};
pub use orchestrator::{App, SessionCommand, SessionEvent, SessionRunner};
pub use utils::Clock;
pub use workflow::{ExamSession, SessionState};
