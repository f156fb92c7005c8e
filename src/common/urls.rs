pub const DEFAULT_CLASS_BASE: &str = "https://class.coursera.org";
pub const DEFAULT_LOGIN_URL: &str = "https://www.coursera.org/maestro/api/user/login";
pub const LOGIN_REFERER: &str = "https://www.coursera.org";

/// 平台地址模板，测试时可以换成本地服务器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformUrls {
    pub class_base: String,
    pub login_url: String,
}

impl Default for PlatformUrls {
    fn default() -> Self {
        Self {
            class_base: DEFAULT_CLASS_BASE.to_string(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
        }
    }
}

impl PlatformUrls {
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            class_base: base.to_string(),
            login_url: format!("{}/maestro/api/user/login", base),
        }
    }

    // 课程大纲页面
    pub fn syllabus_url(&self, class_name: &str) -> String {
        format!("{}/{}/lecture/index", self.class_base, class_name)
    }

    // 为课程生成会话的重定向接口
    pub fn auth_redirector_url(&self, class_name: &str) -> String {
        format!(
            "{}/{}/auth/auth_redirector?type=login&subtype=normal&email=&visiting={}",
            self.class_base,
            class_name,
            urlencoding::encode(&self.syllabus_url(class_name))
        )
    }
}
