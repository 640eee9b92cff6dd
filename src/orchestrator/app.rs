//! 终端应用 - 编排层
//!
//! 组装配置、客户端和会话运行器，把标准输入转成命令、把事件打印到标准输出。

use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::clients::{AuthSession, ExamClient};
use crate::config::Config;
use crate::models::ExamId;
use crate::orchestrator::session_runner::{SessionCommand, SessionEvent, SessionRunner};
use crate::services::attempt_history::AttemptHistory;
use crate::services::presenter;
use crate::utils::{logging, Clock};
use crate::workflow::exam_session::{ExamSession, OptionChoice, SessionState};
use crate::workflow::timer::format_remaining;

const USAGE: &str = "usage: take_exam <exam_id> [--history]";

const HELP: &str = "commands: n/next, p/prev, g <number>, a <letter|option id>, f (flag), \
s (submit), y (confirm), c (cancel), q (leave)";

/// 命令行参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub exam_id: ExamId,
    pub history: bool,
}

/// 解析命令行参数（不含程序名）
pub fn parse_args<I, S>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut exam_id = None;
    let mut history = false;
    for arg in args {
        match arg.as_ref() {
            "--history" => history = true,
            value => {
                if exam_id.is_some() {
                    bail!("unexpected argument: {}\n{}", value, USAGE);
                }
                let id = value
                    .parse::<ExamId>()
                    .with_context(|| format!("invalid exam id: {}\n{}", value, USAGE))?;
                exam_id = Some(id);
            }
        }
    }
    let exam_id = exam_id.context(USAGE)?;
    Ok(CliArgs { exam_id, history })
}

/// 解析一行用户输入
pub fn parse_command(line: &str) -> Option<SessionCommand> {
    let mut parts = line.split_whitespace();
    let head = parts.next()?.to_lowercase();
    let arg = parts.next();
    match (head.as_str(), arg) {
        ("n" | "next", None) => Some(SessionCommand::Next),
        ("p" | "prev", None) => Some(SessionCommand::Previous),
        ("g", Some(number)) => match number.parse::<usize>() {
            Ok(n) if n > 0 => Some(SessionCommand::GoTo(n - 1)),
            _ => None,
        },
        ("a", Some(choice)) => OptionChoice::parse(choice).ok().map(SessionCommand::Answer),
        ("f", None) => Some(SessionCommand::ToggleFlag),
        ("s", None) => Some(SessionCommand::Submit),
        ("y", None) => Some(SessionCommand::Confirm),
        ("c", None) => Some(SessionCommand::Cancel),
        ("q", None) => Some(SessionCommand::Leave),
        _ => None,
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    client: Arc<ExamClient>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let auth = AuthSession::from_optional(config.api_token.as_deref());
        if !auth.is_authenticated() {
            warn!("⚠️ 未配置 EXAM_API_TOKEN，将以匿名身份请求");
        }
        let client = Arc::new(ExamClient::new(&config, auth));
        Ok(Self { config, client })
    }

    /// 运行应用主逻辑
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        logging::log_startup(&self.config, args.exam_id);
        if args.history {
            self.show_history(args.exam_id).await
        } else {
            self.take_exam(args.exam_id).await
        }
    }

    /// 打印作答历史
    async fn show_history(&self, exam_id: ExamId) -> Result<()> {
        let lines = AttemptHistory::new(self.client.as_ref())
            .list(exam_id)
            .await
            .with_context(|| format!("获取考试 {} 的作答历史失败", exam_id))?;
        if lines.is_empty() {
            println!("No attempts yet.");
        }
        for line in lines {
            println!("{}", line);
        }
        Ok(())
    }

    /// 完整作答流程
    async fn take_exam(&self, exam_id: ExamId) -> Result<()> {
        let mut session = ExamSession::new(exam_id);
        let state = session.bootstrap(self.client.as_ref(), &Clock::system()).await;
        if !matches!(state, SessionState::Ready) {
            println!("{}", presenter::render(&session, self.config.urgent_threshold_secs));
            return Ok(());
        }

        logging::log_session_ready(
            session.exam().map(|e| e.display_title()).unwrap_or("Exam"),
            session.questions().len(),
            &format_remaining(session.remaining_secs()),
        );
        println!("{}", HELP);

        let (command_tx, command_rx) = mpsc::channel(16);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        spawn_stdin_reader(command_tx);

        let runner = SessionRunner::new(Arc::clone(&self.client), session, event_tx)
            .with_tick_interval(Duration::from_millis(self.config.tick_interval_ms))
            .with_urgent_threshold(self.config.urgent_threshold_secs);
        let handle = tokio::spawn(runner.run(command_rx));

        while let Some(event) = event_rx.recv().await {
            print_event(&event);
        }

        let session = handle.await.context("会话运行任务异常退出")?;
        info!("🏁 [考试 {}] 会话结束: {}", exam_id, session.state().name());
        Ok(())
    }
}

/// 标准输入放在独立线程中阻塞读取，主程序退出时无需等待
fn spawn_stdin_reader(commands: mpsc::Sender<SessionCommand>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Some(command) => {
                    if commands.blocking_send(command).is_err() {
                        break;
                    }
                }
                None => println!("{}", HELP),
            }
        }
    });
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Updated(snapshot) => println!("\n{}", snapshot),
        SessionEvent::Tick { remaining, urgent } => {
            let step = if *urgent { 30 } else { 60 };
            if remaining % step == 0 {
                let marker = if *urgent { "⏰" } else { "⏱" };
                println!("{} {} remaining", marker, format_remaining(*remaining));
            }
        }
        SessionEvent::ConfirmationRequired { message, .. } => println!("{} [y/c]", message),
        SessionEvent::SubmissionStarted { automatic, .. } => {
            if *automatic {
                println!("⏰ Time is up! Submitting your answers...");
            } else {
                println!("Submitting...");
            }
        }
        SessionEvent::Submitted { summary, .. } => println!("\n{}", summary),
        SessionEvent::SubmitFailed { message } => println!("❌ {}", message),
        SessionEvent::Rejected(e) => println!("⚠️ {}", e),
        SessionEvent::Closed => {}
    }
}
