use std::sync::Arc;
use std::time::Duration;

use cookie::Cookie;
use cookie_store::CookieStore;
use reqwest::{
    Client, ClientBuilder, Response,
    header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT},
};
use reqwest_cookie_store::CookieStoreMutex;
use tracing::{debug, warn};

use crate::auth::{CookieLine, SessionCredentials};

// 带 Cookie 存储的 HTTP 客户端
#[derive(Debug, Clone)]
pub struct CourseraClient {
    pub inner: Client,
    pub cookie_store: Arc<CookieStoreMutex>,
}

impl CourseraClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        let cookie_store = Arc::new(CookieStoreMutex::new(CookieStore::default()));

        // 只限制建立连接的时间，大文件下载不能有总超时
        let inner = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .cookie_provider(Arc::clone(&cookie_store))
            .default_headers(Self::get_default_headers())
            .build()?;

        Ok(Self {
            inner,
            cookie_store,
        })
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36"));
        headers
    }

    // 未认证的请求，Cookie 由存储自动携带
    pub async fn get_raw_response(&self, url: &str) -> Result<Response, reqwest::Error> {
        debug!("GET {}", url);
        self.inner.get(url).send().await
    }

    // 携带会话凭据的请求
    pub async fn get_with_credentials(
        &self,
        url: &str,
        credentials: &SessionCredentials,
    ) -> Result<Response, reqwest::Error> {
        debug!("GET {} (已认证)", url);
        self.inner
            .get(url)
            .headers(credentials.headers())
            .send()
            .await
    }

    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        headers: HeaderMap,
    ) -> Result<Response, reqwest::Error> {
        debug!("POST {}", url);
        self.inner
            .post(url)
            .headers(headers)
            .form(form)
            .send()
            .await
    }

    // 按名字读取 Cookie
    pub fn cookie_value(&self, name: &str) -> Option<String> {
        let store = self.cookie_store.lock().ok()?;
        store
            .iter_any()
            .find(|c| c.name() == name)
            .map(|c| c.value().to_string())
    }

    // 把 Cookie 文件中的条目写入存储，返回成功写入的数量
    pub fn insert_cookies(&self, cookies: &[CookieLine]) -> usize {
        let mut store = match self.cookie_store.lock() {
            Ok(store) => store,
            Err(_) => {
                warn!("Cookie 存储加锁失败");
                return 0;
            }
        };

        let mut inserted = 0;
        for line in cookies {
            let Some(url) = line.origin_url() else {
                warn!("无法为 Cookie {} 生成来源地址: {}", line.name, line.domain);
                continue;
            };

            let mut builder = Cookie::build((line.name.clone(), line.value().to_string()))
                .path(line.path.clone())
                .secure(line.secure);
            if line.tailmatch {
                builder = builder.domain(line.domain.trim_start_matches('.').to_string());
            }

            match store.insert_raw(&builder.build(), &url) {
                Ok(_) => inserted += 1,
                Err(e) => warn!("Cookie {} 写入失败: {}", line.name, e),
            }
        }
        inserted
    }
}
