use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP错误: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("下载 {url} 失败，状态码: {status}")]
    HttpStatus { url: String, status: StatusCode },

    #[error("{program} 退出码异常: {code:?}")]
    ExternalFailed { program: String, code: Option<i32> },

    #[error("用户取消了下载")]
    Cancelled,
}

impl DownloadError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DownloadError::Cancelled)
    }
}
