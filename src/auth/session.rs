use std::fmt;

use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue};

use super::errors::{AuthError, Result};

pub const CSRF_COOKIE: &str = "csrf_token";
pub const SESSION_COOKIE: &str = "session";

const CSRF_HEADER: &str = "x-csrftoken";

/// 一次课程下载过程中使用的会话凭据。
///
/// 登录成功后创建，之后只读；抓取页面和下载文件时显式传入，
/// 不存在任何全局的令牌状态。
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    csrf_token: String,
    session: String,
}

impl SessionCredentials {
    pub fn new(csrf_token: impl Into<String>, session: impl Into<String>) -> Result<Self> {
        let credentials = Self {
            csrf_token: csrf_token.into(),
            session: session.into(),
        };

        // 两个值都会进入请求头，提前校验
        HeaderValue::from_str(&credentials.cookie_header())
            .map_err(|_| AuthError::InvalidCredentials("Cookie 中包含非法字符".to_string()))?;

        Ok(credentials)
    }

    /// 不带任何令牌的凭据，只在离线处理本地页面时使用
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.csrf_token.is_empty() && self.session.is_empty()
    }

    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    /// `Cookie` 头的值，外部下载器使用同样的字符串
    pub fn cookie_header(&self) -> String {
        format!(
            "{}={}; {}={}",
            CSRF_COOKIE, self.csrf_token, SESSION_COOKIE, self.session
        )
    }

    /// 每个认证请求都要带上的请求头：会话 Cookie 和 CSRF 头
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.cookie_header()) {
            headers.insert(COOKIE, value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.csrf_token) {
            headers.insert(HeaderName::from_static(CSRF_HEADER), value);
        }
        headers
    }
}

// 令牌不能出现在日志里
impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("csrf_token", &"[REDACTED]")
            .field("session", &"[REDACTED]")
            .finish()
    }
}
