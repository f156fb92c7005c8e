use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use coursera_downloader::app::App;
use coursera_downloader::cli::Cli;
use coursera_downloader::common::logger::{PrettyLogger, Verbosity, init_tracing};
use coursera_downloader::config::AppConfig;
use coursera_downloader::downloader::spawn_interrupt_listener;

/// 用户取消时的退出码
const EXIT_CANCELLED: u8 = 130;

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = AppConfig::from_cli(&cli)?;

    // 从这里开始 Ctrl-C 由程序自己处理
    let cancel = spawn_interrupt_listener();
    let app = App::new(config, cancel).await?;

    match app.run().await {
        Ok(completed) => {
            PrettyLogger::completion_summary(&completed);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_cancelled() => {
            PrettyLogger::warning("下载已取消");
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // 解析命令行参数
    let cli = Cli::parse();

    // 初始化日志
    init_tracing(Verbosity::from_flags(cli.debug, cli.quiet));

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
