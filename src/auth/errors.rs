use reqwest::StatusCode;
use thiserror::Error;

use super::cookies::CookieError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("网络请求失败: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO操作失败: {0}")]
    IoError(#[from] std::io::Error),

    #[error("登录失败，状态码: {0}")]
    AuthenticationFailed(StatusCode),

    #[error("找不到课程: {0}")]
    ClassNotFound(String),

    #[error("课程会话重定向失败，状态码: {0}")]
    RedirectFailed(StatusCode),

    #[error("响应中缺少 Cookie: {0}")]
    MissingCookie(&'static str),

    #[error("无效的凭据: {0}")]
    InvalidCredentials(String),

    #[error("Cookie 文件解析失败: {0}")]
    Cookie(#[from] CookieError),

    #[error("netrc 中找不到机器 {0} 的账号信息")]
    NetrcNotFound(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
