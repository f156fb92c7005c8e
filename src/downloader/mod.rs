pub mod backend;
pub mod bandwidth;
pub mod error;
pub mod external;
pub mod models;
pub mod native;
pub mod planner;

use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::auth::SessionCredentials;
use backend::TransferBackend;
use error::DownloadError;
use models::{DownloadReport, DownloadTask};
use planner::DownloadPlan;

/// 按顺序执行下载计划。
///
/// 单个文件失败只记录日志并继续；取消令牌触发时删除正在下载的文件并返回
/// [`DownloadError::Cancelled`]。
pub struct LectureDownloader {
    backend: Box<dyn TransferBackend>,
    skip_download: bool,
    cancel: CancellationToken,
}

impl LectureDownloader {
    pub fn new(
        backend: Box<dyn TransferBackend>,
        skip_download: bool,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            skip_download,
            cancel,
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub async fn download(
        &self,
        plan: DownloadPlan,
        credentials: &SessionCredentials,
    ) -> Result<DownloadReport, DownloadError> {
        let DownloadPlan {
            tasks,
            mut completion,
            skipped,
        } = plan;
        let mut report = DownloadReport {
            skipped,
            ..Default::default()
        };

        for task in &tasks {
            if self.cancel.is_cancelled() {
                return Err(DownloadError::Cancelled);
            }

            if let Err(e) = ensure_parent_dir(&task.output_path).await {
                error!("无法创建目录 {}: {}", task.output_path.display(), e);
                report.failed += 1;
                continue;
            }

            if self.skip_download {
                // 只创建空文件占位
                match tokio::fs::File::create(&task.output_path).await {
                    Ok(_) => {
                        debug!("创建占位文件: {}", task.output_path.display());
                        report.placeholders += 1;
                        completion.observe(SystemTime::now());
                    }
                    Err(e) => {
                        error!("无法创建 {}: {}", task.output_path.display(), e);
                        report.failed += 1;
                    }
                }
                continue;
            }

            info!("Downloading: {}", task.output_path.display());
            match self.transfer(task, credentials).await {
                Ok(()) => {
                    report.downloaded += 1;
                    completion.observe(SystemTime::now());
                }
                Err(DownloadError::Cancelled) => return Err(DownloadError::Cancelled),
                Err(e) => {
                    error!("下载失败 {}: {}", task.url, e);
                    report.failed += 1;
                    // 残缺的文件会在下次运行时被当成已下载
                    remove_partial(&task.output_path).await;
                }
            }
        }

        report.completed = completion.is_complete();
        Ok(report)
    }

    async fn transfer(
        &self,
        task: &DownloadTask,
        credentials: &SessionCredentials,
    ) -> Result<(), DownloadError> {
        let outcome = tokio::select! {
            result = self.backend.transfer(&task.url, &task.output_path, credentials) => Some(result),
            _ = self.cancel.cancelled() => None,
        };

        match outcome {
            Some(result) => result,
            None => {
                info!("用户中断，删除未完成的文件: {}", task.output_path.display());
                remove_partial(&task.output_path).await;
                Err(DownloadError::Cancelled)
            }
        }
    }
}

/// 监听 Ctrl-C，收到后触发返回的令牌。
///
/// 整个进程只应调用一次：注册之后 Ctrl-C 不再直接结束进程。
pub fn spawn_interrupt_listener() -> CancellationToken {
    let token = CancellationToken::new();
    let signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("收到中断信号，正在停止");
            signal.cancel();
        }
    });
    token
}

// 目录已存在视为成功
async fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    match tokio::fs::create_dir_all(dir).await {
        Err(e) if e.kind() != ErrorKind::AlreadyExists => Err(e),
        _ => Ok(()),
    }
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("已删除 {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("删除 {} 失败: {}", path.display(), e),
    }
}
