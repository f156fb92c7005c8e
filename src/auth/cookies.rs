//! Netscape 格式 Cookie 文件的读取与生成。
//!
//! 每行 7 个 TAB 分隔字段：`domain`, `tailmatch`, `path`, `secure`,
//! `expires`, `name`, `value`。以 `#` 开头的行和空行会被忽略，
//! 但浏览器导出时 HttpOnly 的 Cookie 带有 `#HttpOnly_` 前缀，仍然是有效条目。

use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use super::session::{CSRF_COOKIE, SESSION_COOKIE, SessionCredentials};

pub const NETSCAPE_HEADER: &str = "# Netscape HTTP Cookie File";

const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// 会话 Cookie 的作用域
pub const COOKIE_DOMAIN: &str = ".coursera.org";

#[derive(Clone, PartialEq, Eq)]
pub struct CookieLine {
    pub domain: String,
    pub tailmatch: bool,
    pub path: String,
    pub secure: bool,
    pub expires: u64,
    pub name: String,
    value: String,
}

impl CookieLine {
    pub fn new(
        domain: impl Into<String>,
        path: impl Into<String>,
        secure: bool,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let domain = domain.into();
        Self {
            tailmatch: domain.starts_with('.'),
            domain,
            path: path.into(),
            secure,
            expires: 0,
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// 写入 Cookie 存储时使用的来源地址
    pub fn origin_url(&self) -> Option<url::Url> {
        let scheme = if self.secure { "https" } else { "http" };
        let host = self.domain.trim_start_matches('.');
        let path = if self.path.starts_with('/') {
            self.path.as_str()
        } else {
            "/"
        };
        url::Url::parse(&format!("{}://{}{}", scheme, host, path)).ok()
    }

    fn render(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.domain,
            bool_field(self.tailmatch),
            self.path,
            bool_field(self.secure),
            self.expires,
            self.name,
            self.value
        )
    }
}

impl fmt::Debug for CookieLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieLine")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum CookieError {
    #[error("第 {line} 行格式错误: {reason}")]
    InvalidLine { line: usize, reason: String },

    #[error("文件中没有任何有效的 Cookie")]
    NoCookiesFound,
}

/// 解析 Netscape Cookie 文件内容，格式错误的行会被跳过并记录警告
pub fn parse_netscape_cookies(text: &str) -> Result<Vec<CookieLine>, CookieError> {
    let mut cookies = Vec::new();
    let mut data_lines = 0;

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim_end();
        let line = line.strip_prefix(HTTP_ONLY_PREFIX).unwrap_or(line);
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        data_lines += 1;

        match parse_cookie_line(line, idx + 1) {
            Ok(cookie) => {
                debug!("读取 Cookie: {} ({})", cookie.name, cookie.domain);
                cookies.push(cookie);
            }
            Err(e) => warn!("跳过格式错误的 Cookie 行: {}", e),
        }
    }

    if cookies.is_empty() && data_lines > 0 {
        return Err(CookieError::NoCookiesFound);
    }

    Ok(cookies)
}

fn parse_cookie_line(line: &str, line_number: usize) -> Result<CookieLine, CookieError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 7 {
        return Err(CookieError::InvalidLine {
            line: line_number,
            reason: format!("需要 7 个字段，实际 {} 个", fields.len()),
        });
    }

    let parse_bool = |value: &str, name: &str| match value {
        "TRUE" => Ok(true),
        "FALSE" => Ok(false),
        other => Err(CookieError::InvalidLine {
            line: line_number,
            reason: format!("{} 字段应为 TRUE 或 FALSE，实际为 {}", name, other),
        }),
    };

    let expires = fields[4]
        .parse::<u64>()
        .map_err(|_| CookieError::InvalidLine {
            line: line_number,
            reason: format!("无效的过期时间: {}", fields[4]),
        })?;

    Ok(CookieLine {
        domain: fields[0].to_string(),
        tailmatch: parse_bool(fields[1], "tailmatch")?,
        path: fields[2].to_string(),
        secure: parse_bool(fields[3], "secure")?,
        expires,
        name: fields[5].to_string(),
        value: fields[6].to_string(),
    })
}

fn bool_field(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

/// 生成 Netscape 格式的 Cookie 文件，第一行总是文件头注释
pub fn render_netscape_cookies(cookies: &[CookieLine]) -> String {
    let mut out = String::from(NETSCAPE_HEADER);
    out.push('\n');
    for cookie in cookies {
        out.push_str(&cookie.render());
        out.push('\n');
    }
    out
}

/// 把内存中的会话凭据导出为 Cookie 文件内容
pub fn credentials_to_netscape(credentials: &SessionCredentials) -> String {
    let cookies = [
        CookieLine::new(COOKIE_DOMAIN, "/", true, CSRF_COOKIE, credentials.csrf_token()),
        CookieLine::new(COOKIE_DOMAIN, "/", true, SESSION_COOKIE, credentials.session()),
    ];
    render_netscape_cookies(&cookies)
}

/// 按名字查找 Cookie 值，同名时取最后一个
pub fn find_cookie<'a>(cookies: &'a [CookieLine], name: &str) -> Option<&'a str> {
    cookies
        .iter()
        .rev()
        .find(|c| c.name == name)
        .map(|c| c.value())
}
