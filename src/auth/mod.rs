pub mod cookies;
pub mod errors;
pub mod netrc;
pub mod session;

use std::path::Path;

use reqwest::StatusCode;
use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue, REFERER};
use tracing::{debug, info, warn};

use crate::common::client::CourseraClient;
use crate::common::urls::{LOGIN_REFERER, PlatformUrls};
pub use cookies::{CookieLine, credentials_to_netscape, parse_netscape_cookies};
use cookies::find_cookie;
pub use errors::{AuthError, Result};
pub use session::{CSRF_COOKIE, SESSION_COOKIE, SessionCredentials};

/// 用账号密码或 Cookie 文件换取某门课程的会话凭据。
///
/// 每门课程使用一个新的认证器，Cookie 存储只在登录过程中使用，
/// 登录结果以 [`SessionCredentials`] 的形式交给后续步骤。
#[derive(Debug)]
pub struct Authenticator {
    client: CourseraClient,
    urls: PlatformUrls,
}

impl Authenticator {
    pub fn new(urls: PlatformUrls) -> Result<Self> {
        Ok(Self {
            client: CourseraClient::new()?,
            urls,
        })
    }

    // 账号密码登录流程
    pub async fn login(
        &self,
        class_name: &str,
        username: &str,
        password: &str,
    ) -> Result<SessionCredentials> {
        // 先访问一次课程大纲页面，服务器会下发 csrf_token
        let syllabus_url = self.urls.syllabus_url(class_name);
        let resp = self.client.get_raw_response(&syllabus_url).await?;
        debug!("获取 csrf_token: {} -> {}", syllabus_url, resp.status());

        let csrf_token = resp
            .cookies()
            .find(|c| c.name() == CSRF_COOKIE)
            .map(|c| c.value().to_string())
            .or_else(|| self.client.cookie_value(CSRF_COOKIE))
            .ok_or(AuthError::MissingCookie(CSRF_COOKIE))?;

        let mut headers = HeaderMap::new();
        let cookie = HeaderValue::from_str(&format!("csrftoken={}", csrf_token))
            .map_err(|_| AuthError::InvalidCredentials("csrf_token 含有非法字符".to_string()))?;
        headers.insert(COOKIE, cookie);
        headers.insert(REFERER, HeaderValue::from_static(LOGIN_REFERER));
        if let Ok(value) = HeaderValue::from_str(&csrf_token) {
            headers.insert(HeaderName::from_static("x-csrftoken"), value);
        }

        let form = [("email_address", username), ("password", password)];
        let resp = self
            .client
            .post_form(&self.urls.login_url, &form, headers)
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!("登录被拒绝: {} ({})", username, status);
            return Err(AuthError::AuthenticationFailed(status));
        }
        info!("登录成功: {}", username);

        let session = self
            .mint_class_session(class_name)
            .await?
            .or_else(|| self.client.cookie_value(SESSION_COOKIE))
            .ok_or(AuthError::MissingCookie(SESSION_COOKIE))?;

        SessionCredentials::new(csrf_token, session)
    }

    // 使用已有的 Cookie 文件
    pub async fn login_with_cookies_file(
        &self,
        class_name: &str,
        path: &Path,
    ) -> Result<SessionCredentials> {
        info!("从 Cookie 文件加载登录状态: {}", path.display());
        let text = tokio::fs::read_to_string(path).await?;
        let cookies = parse_netscape_cookies(&text)?;
        let loaded = self.client.insert_cookies(&cookies);
        debug!("已加载 {}/{} 个 Cookie", loaded, cookies.len());

        let csrf_token = find_cookie(&cookies, CSRF_COOKIE)
            .unwrap_or_default()
            .to_string();

        let session = self
            .mint_class_session(class_name)
            .await?
            .or_else(|| self.client.cookie_value(SESSION_COOKIE))
            .or_else(|| find_cookie(&cookies, SESSION_COOKIE).map(str::to_string))
            .ok_or(AuthError::MissingCookie(SESSION_COOKIE))?;

        SessionCredentials::new(csrf_token, session)
    }

    // 访问课程的重定向接口，服务器会为这门课程下发新的 session
    async fn mint_class_session(&self, class_name: &str) -> Result<Option<String>> {
        let url = self.urls.auth_redirector_url(class_name);
        let resp = self.client.get_raw_response(&url).await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(AuthError::ClassNotFound(class_name.to_string())),
            status if status.is_success() => Ok(resp
                .cookies()
                .find(|c| c.name() == SESSION_COOKIE)
                .map(|c| c.value().to_string())),
            status => Err(AuthError::RedirectFailed(status)),
        }
    }
}
