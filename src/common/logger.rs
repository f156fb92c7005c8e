use colored::*;
use tracing::Level;

/// 日志详细程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Debug,
    #[default]
    Normal,
    Quiet,
}

impl Verbosity {
    pub fn from_flags(debug: bool, quiet: bool) -> Self {
        if debug {
            Verbosity::Debug
        } else if quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }

    pub fn level(self) -> Level {
        match self {
            Verbosity::Debug => Level::DEBUG,
            Verbosity::Normal => Level::INFO,
            Verbosity::Quiet => Level::ERROR,
        }
    }
}

/// 初始化 tracing 输出，只能调用一次
pub fn init_tracing(verbosity: Verbosity) {
    tracing_subscriber::fmt()
        .with_max_level(verbosity.level())
        .with_target(verbosity == Verbosity::Debug)
        .init();
}

/// 漂亮的日志输出工具。
///
/// 是否输出跟随 tracing 的级别，`--quiet` 时只剩错误信息。
pub struct PrettyLogger;

impl PrettyLogger {
    fn visible(level: Level) -> bool {
        if level == Level::WARN {
            tracing::enabled!(Level::WARN)
        } else {
            tracing::enabled!(Level::INFO)
        }
    }

    /// 显示成功消息
    pub fn success(message: impl AsRef<str>) {
        if Self::visible(Level::INFO) {
            println!("{} {}", "✓".green().bold(), message.as_ref());
        }
    }

    /// 显示警告消息
    pub fn warning(message: impl AsRef<str>) {
        if Self::visible(Level::WARN) {
            println!("{} {}", "⚠".yellow().bold(), message.as_ref());
        }
    }

    /// 显示步骤开始
    pub fn step_start(step: impl AsRef<str>) {
        if Self::visible(Level::INFO) {
            println!("\n{} {}", "▶".cyan().bold(), step.as_ref().bold());
        }
    }

    /// 列出看起来已经结课的课程
    pub fn completion_summary(classes: &[String]) {
        if classes.is_empty() || !Self::visible(Level::INFO) {
            return;
        }
        println!(
            "\n{} {}",
            "Classes which appear completed:".green().bold(),
            classes.join(" ")
        );
    }
}

#[macro_export]
macro_rules! log_success {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::success(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_step {
    ($($arg:tt)*) => {
        $crate::common::logger::PrettyLogger::step_start(format!($($arg)*))
    };
}
