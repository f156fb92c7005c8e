use std::future::Future;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::auth::{AuthError, Authenticator, SessionCredentials};
use crate::common::client::CourseraClient;
use crate::common::error::FetchError;
use crate::common::page::PageFetcher;
use crate::config::{AppConfig, CredentialSource};
use crate::downloader::LectureDownloader;
use crate::downloader::backend::{TransferBackend, select_backend};
use crate::downloader::error::DownloadError;
use crate::downloader::models::DownloadReport;
use crate::downloader::planner::DownloadPlanner;
use crate::{log_step, log_success};
use crate::parser::SyllabusParser;
use crate::parser::errors::ParseError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("认证失败: {0}")]
    Auth(#[from] AuthError),

    #[error("获取页面失败: {0}")]
    Fetch(#[from] FetchError),

    #[error("解析失败: {0}")]
    Parse(#[from] ParseError),

    #[error("下载失败: {0}")]
    Download(#[from] DownloadError),
}

impl AppError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Download(e) if e.is_cancelled())
    }
}

/// 依次处理每一门课程：认证、抓取、解析、规划、下载
pub struct App {
    config: AppConfig,
    client: CourseraClient,
    downloader: LectureDownloader,
    cancel: CancellationToken,
}

impl App {
    /// `cancel` 触发后，当前阶段结束（或中断正在进行的下载）并返回取消错误
    pub async fn new(config: AppConfig, cancel: CancellationToken) -> Result<Self, AppError> {
        let client = CourseraClient::new().map_err(FetchError::from)?;
        let backend = select_backend(&config.external_programs, client.clone()).await;
        Ok(Self::assemble(config, client, backend, cancel))
    }

    /// 使用指定的下载方式，测试时可以替换成假的实现
    pub fn with_backend(
        config: AppConfig,
        backend: Box<dyn TransferBackend>,
        cancel: CancellationToken,
    ) -> Result<Self, AppError> {
        let client = CourseraClient::new().map_err(FetchError::from)?;
        Ok(Self::assemble(config, client, backend, cancel))
    }

    fn assemble(
        config: AppConfig,
        client: CourseraClient,
        backend: Box<dyn TransferBackend>,
        cancel: CancellationToken,
    ) -> Self {
        let downloader = LectureDownloader::new(backend, config.skip_download, cancel.clone());
        Self {
            config,
            client,
            downloader,
            cancel,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn check_cancelled(&self) -> Result<(), AppError> {
        if self.cancel.is_cancelled() {
            return Err(DownloadError::Cancelled.into());
        }
        Ok(())
    }

    // 网络请求可能很慢，取消时直接放弃
    async fn until_cancelled<T>(
        &self,
        fut: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        tokio::select! {
            result = fut => result,
            _ = self.cancel.cancelled() => Err(DownloadError::Cancelled.into()),
        }
    }

    // 离线模式：只处理本地页面时不需要登录
    fn offline(&self) -> bool {
        self.config.skip_download
            && self
                .config
                .local_page
                .as_deref()
                .is_some_and(|p| p.is_file())
    }

    async fn authenticate(&self, class_name: &str) -> Result<SessionCredentials, AppError> {
        if self.offline() {
            info!("使用本地页面且不下载，跳过登录");
            return Ok(SessionCredentials::anonymous());
        }

        let auth = Authenticator::new(self.config.urls.clone())?;
        let credentials = match &self.config.credentials {
            CredentialSource::Password { username, password } => {
                auth.login(class_name, username, password).await?
            }
            CredentialSource::CookiesFile(path) => {
                auth.login_with_cookies_file(class_name, path).await?
            }
        };
        Ok(credentials)
    }

    pub async fn download_class(&self, class_name: &str) -> Result<DownloadReport, AppError> {
        self.check_cancelled()?;
        log_step!("课程: {}", class_name);

        let credentials = self.until_cancelled(self.authenticate(class_name)).await?;

        let syllabus_url = self.config.urls.syllabus_url(class_name);
        let fetcher = PageFetcher::new(&self.client);
        let page = self
            .until_cancelled(async {
                fetcher
                    .fetch_syllabus(
                        &syllabus_url,
                        &credentials,
                        self.config.local_page.as_deref(),
                    )
                    .await
                    .map_err(AppError::from)
            })
            .await?;

        self.check_cancelled()?;
        let course = SyllabusParser::new(self.config.reverse).parse(&page)?;

        let planner = DownloadPlanner::new(self.config.plan_options(class_name));
        let plan = planner.plan(&course).await;
        self.check_cancelled()?;
        info!(
            "{} 个文件待下载 ({})，{} 个已存在",
            plan.tasks.len(),
            self.downloader.backend_name(),
            plan.skipped
        );

        let report = self.downloader.download(plan, &credentials).await?;
        if report.failed > 0 {
            warn!("{} 个文件下载失败: {}", report.failed, class_name);
        }
        if report.completed {
            info!("COURSE PROBABLY COMPLETE: {}", class_name);
        }
        log_success!(
            "{}: 下载 {} 个，占位 {} 个，跳过 {} 个",
            class_name,
            report.downloaded,
            report.placeholders,
            report.skipped
        );
        Ok(report)
    }

    /// 处理所有课程，返回看起来已经结课的课程
    pub async fn run(&self) -> Result<Vec<String>, AppError> {
        let mut completed = Vec::new();

        for class_name in &self.config.class_names {
            match self.download_class(class_name).await {
                Ok(report) => {
                    if report.completed {
                        completed.push(class_name.clone());
                    }
                }
                Err(e) if e.is_cancelled() => return Err(e),
                Err(AppError::Auth(AuthError::ClassNotFound(name))) => {
                    error!("找不到课程: {}", name);
                }
                Err(e) => {
                    error!("课程 {} 处理失败: {}", class_name, e);
                }
            }
        }

        Ok(completed)
    }
}
