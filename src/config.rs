use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use regex::Regex;
use tracing::debug;

use crate::auth::netrc::credentials_from_netrc;
use crate::cli::Cli;
use crate::common::logger::Verbosity;
use crate::common::urls::PlatformUrls;
use crate::downloader::external::{ExternalProgram, ExternalTool};
use crate::downloader::planner::PlanOptions;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// 登录方式
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Password { username: String, password: String },
    CookiesFile(PathBuf),
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            CredentialSource::CookiesFile(path) => f.debug_tuple("CookiesFile").field(path).finish(),
        }
    }
}

/// 一次运行的全部配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub class_names: Vec<String>,
    pub credentials: CredentialSource,
    pub formats: Vec<String>,
    pub section_filter: Option<Regex>,
    pub lecture_filter: Option<Regex>,
    pub external_programs: Vec<ExternalProgram>,
    pub overwrite: bool,
    pub skip_download: bool,
    pub local_page: Option<PathBuf>,
    pub output_root: PathBuf,
    pub verbose_dirs: bool,
    pub reverse: bool,
    pub stale_after: Duration,
    pub verbosity: Verbosity,
    pub urls: PlatformUrls,
}

impl AppConfig {
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let credentials = resolve_credentials(cli)?;

        let class_names = cli
            .class_names
            .iter()
            .chain(&cli.add_class)
            .cloned()
            .collect();

        let external_programs = [
            (ExternalTool::Wget, &cli.wget_bin),
            (ExternalTool::Curl, &cli.curl_bin),
            (ExternalTool::Aria2, &cli.aria2_bin),
            (ExternalTool::Axel, &cli.axel_bin),
        ]
        .into_iter()
        .filter_map(|(tool, bin)| bin.as_ref().map(|b| ExternalProgram::new(tool, b)))
        .collect();

        Ok(Self {
            class_names,
            credentials,
            formats: cli.formats.split_whitespace().map(str::to_string).collect(),
            section_filter: compile_filter(cli.section_filter.as_deref(), "章节")?,
            lecture_filter: compile_filter(cli.lecture_filter.as_deref(), "讲座")?,
            external_programs,
            overwrite: cli.overwrite,
            skip_download: cli.skip_download,
            local_page: cli.local_page.clone(),
            output_root: cli.path.clone(),
            verbose_dirs: cli.verbose_dirs,
            reverse: cli.reverse,
            stale_after: Duration::from_secs(cli.complete_after_days * SECONDS_PER_DAY),
            verbosity: Verbosity::from_flags(cli.debug, cli.quiet),
            urls: PlatformUrls::default(),
        })
    }

    pub fn plan_options(&self, class_name: &str) -> PlanOptions {
        PlanOptions {
            class_name: class_name.to_string(),
            formats: self.formats.clone(),
            section_filter: self.section_filter.clone(),
            lecture_filter: self.lecture_filter.clone(),
            output_root: self.output_root.clone(),
            verbose_dirs: self.verbose_dirs,
            overwrite: self.overwrite,
            stale_after: self.stale_after,
        }
    }
}

fn compile_filter(pattern: Option<&str>, what: &str) -> anyhow::Result<Option<Regex>> {
    pattern
        .map(|p| Regex::new(p).with_context(|| format!("无效的{}过滤条件: {}", what, p)))
        .transpose()
}

// Cookie 文件优先，其次是命令行账号，最后是 netrc（没有 -n 时用默认路径）
fn resolve_credentials(cli: &Cli) -> anyhow::Result<CredentialSource> {
    if let Some(path) = &cli.cookies_file {
        if !path.is_file() {
            bail!("Cookie 文件不存在: {}", path.display());
        }
        return Ok(CredentialSource::CookiesFile(path.clone()));
    }

    if let Some(username) = &cli.username {
        let password = match &cli.password {
            Some(password) => password.clone(),
            None => prompt_password(username).context("读取密码失败")?,
        };
        return Ok(CredentialSource::Password {
            username: username.clone(),
            password,
        });
    }

    let netrc = cli.netrc.clone().flatten();
    let (username, password) = credentials_from_netrc(netrc.as_deref())
        .context("无法从 netrc 读取账号，请使用 -u/-p、-n 或 -c 参数")?;
    debug!("使用 netrc 中的账号: {}", username);
    Ok(CredentialSource::Password { username, password })
}

// 输入时不回显
fn prompt_password(username: &str) -> io::Result<String> {
    rpassword::prompt_password(format!("Coursera 密码 ({}): ", username))
}
