use std::path::Path;

use tracing::{debug, info, warn};

use super::client::CourseraClient;
use super::error::FetchError;
use crate::auth::SessionCredentials;

/// 带凭据抓取页面，可选地使用本地缓存
pub struct PageFetcher<'a> {
    client: &'a CourseraClient,
}

impl<'a> PageFetcher<'a> {
    pub fn new(client: &'a CourseraClient) -> Self {
        Self { client }
    }

    pub async fn fetch(
        &self,
        url: &str,
        credentials: &SessionCredentials,
    ) -> Result<String, FetchError> {
        let resp = self.client.get_with_credentials(url, credentials).await?;
        let status = resp.status();
        if !status.is_success() {
            warn!("页面请求失败: {} ({})", url, status);
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(resp.text().await?)
    }

    /// 获取课程大纲页面。
    ///
    /// 指定了本地页面且文件存在时直接读取；否则在线抓取，并在指定了路径时写入缓存。
    pub async fn fetch_syllabus(
        &self,
        url: &str,
        credentials: &SessionCredentials,
        local_page: Option<&Path>,
    ) -> Result<String, FetchError> {
        if let Some(path) = local_page {
            if tokio::fs::try_exists(path).await.unwrap_or(false) {
                let page = tokio::fs::read_to_string(path).await?;
                info!("读取本地页面 {} ({} 字节)", path.display(), page.len());
                return Ok(page);
            }
        }

        let page = self.fetch(url, credentials).await?;
        debug!("下载课程大纲 {} ({} 字节)", url, page.len());

        if let Some(path) = local_page {
            tokio::fs::write(path, &page).await?;
            info!("已缓存页面到 {}", path.display());
        }
        Ok(page)
    }
}
