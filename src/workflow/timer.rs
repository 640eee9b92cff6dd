//! 倒计时
//!
//! 只负责"剩余多少秒"和"何时到点"，真正的节拍由运行层驱动。

use chrono::{DateTime, Utc};

/// 根据服务端记录的开始时间计算剩余秒数
///
/// `remaining = max(0, duration - elapsed)`；没有开始时间时返回完整时长，
/// 开始时间在未来（时钟偏差）时按已用 0 秒处理。
pub fn remaining_seconds(
    duration_secs: u64,
    started_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> u64 {
    let Some(started_at) = started_at else {
        return duration_secs;
    };
    let elapsed = (now - started_at).num_seconds().max(0) as u64;
    duration_secs.saturating_sub(elapsed)
}

/// 格式化剩余时间：不少于 1 小时为 `H:MM:SS`，否则 `M:SS`
pub fn format_remaining(seconds: u64) -> String {
    let hrs = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hrs > 0 {
        format!("{}:{:02}:{:02}", hrs, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

/// 一次节拍的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 继续计时
    Running { remaining: u64 },
    /// 本次节拍到点（整个生命周期只出现一次）
    Expired,
    /// 已到点或已停止，不再计时
    Stopped,
}

/// 倒计时
#[derive(Debug, Clone)]
pub struct Countdown {
    remaining: u64,
    expired: bool,
    stopped: bool,
}

impl Countdown {
    pub fn new(remaining: u64) -> Self {
        Self {
            remaining,
            expired: false,
            stopped: false,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// 是否还需要继续节拍
    pub fn is_running(&self) -> bool {
        !self.expired && !self.stopped
    }

    pub fn has_expired(&self) -> bool {
        self.expired
    }

    /// 剩余时间是否进入紧急区间
    pub fn is_urgent(&self, threshold_secs: u64) -> bool {
        self.remaining <= threshold_secs
    }

    /// 走一秒
    ///
    /// 剩余 1 秒（或开局即为 0）时本次节拍返回 `Expired`，之后一律 `Stopped`。
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Stopped;
        }
        if self.remaining <= 1 {
            self.remaining = 0;
            self.expired = true;
            return TickOutcome::Expired;
        }
        self.remaining -= 1;
        TickOutcome::Running {
            remaining: self.remaining,
        }
    }

    /// 停止计时（交卷后）
    pub fn stop(&mut self) {
        self.stopped = true;
    }
}
