use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("网络请求失败: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("请求 {url} 失败，状态码: {status}")]
    Status { url: String, status: StatusCode },

    #[error("读写本地页面失败: {0}")]
    Io(#[from] std::io::Error),
}
