//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `session_runner` - 会话运行器
//! - 唯一的事件循环：节拍、用户命令、进行中的交卷请求
//! - 独占 `ExamSession`，保证只交卷一次
//!
//! ### `app` - 终端应用
//! - 初始化客户端、启动会话、打印事件
//! - 标准输入 → `SessionCommand`
//!
//! ## 层次关系
//!
//! ```text
//! app (stdin / stdout)
//!     ↓
//! session_runner (select! 事件循环)
//!     ↓
//! workflow::ExamSession (状态机)
//!     ↓
//! clients::ExamApi (REST)
//! ```

pub mod app;
pub mod session_runner;

pub use app::{parse_args, parse_command, App, CliArgs};
pub use session_runner::{SessionCommand, SessionEvent, SessionRunner};
