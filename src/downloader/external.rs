use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::backend::TransferBackend;
use super::error::DownloadError;
use crate::auth::SessionCredentials;

/// 支持的外部下载工具，顺序即优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExternalTool {
    Wget,
    Curl,
    Aria2,
    Axel,
}

impl ExternalTool {
    pub fn name(self) -> &'static str {
        match self {
            ExternalTool::Wget => "wget",
            ExternalTool::Curl => "curl",
            ExternalTool::Aria2 => "aria2",
            ExternalTool::Axel => "axel",
        }
    }

    // 各工具传递 Cookie 的方式不同
    pub fn build_args(self, url: &str, output: &Path, cookie: &str) -> Vec<OsString> {
        let header = format!("Cookie: {}", cookie);
        let header = header.as_str();
        let output = vec![output.as_os_str().to_os_string()];
        let os = |items: &[&str]| items.iter().map(OsString::from).collect::<Vec<_>>();

        match self {
            ExternalTool::Wget => [
                os(&[url, "-O"]),
                output,
                os(&["--no-cookies", "--header", header, "--no-check-certificate"]),
            ]
            .concat(),
            ExternalTool::Curl => [
                os(&[url, "-k", "-#", "-L", "-o"]),
                output,
                os(&["--cookie", cookie]),
            ]
            .concat(),
            ExternalTool::Aria2 => [
                os(&[url, "-o"]),
                output,
                os(&[
                    "--header",
                    header,
                    "--check-certificate=false",
                    "--log-level=notice",
                    "--max-connection-per-server=4",
                    "--min-split-size=1M",
                ]),
            ]
            .concat(),
            ExternalTool::Axel => [
                os(&["-H", header, "-o"]),
                output,
                os(&["-n", "4", "-a", url]),
            ]
            .concat(),
        }
    }
}

/// 用户配置的外部程序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProgram {
    pub tool: ExternalTool,
    pub bin: PathBuf,
}

impl ExternalProgram {
    pub fn new(tool: ExternalTool, bin: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            bin: bin.into(),
        }
    }

    // 能启动就认为可用
    pub async fn is_available(&self) -> bool {
        debug!("检查 {} 是否可用: {}", self.tool.name(), self.bin.display());
        Command::new(&self.bin)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok()
    }
}

/// 调用外部程序下载，退出码为 0 视为成功
#[derive(Debug, Clone)]
pub struct ExternalBackend {
    program: ExternalProgram,
}

impl ExternalBackend {
    pub fn new(program: ExternalProgram) -> Self {
        Self { program }
    }
}

#[async_trait]
impl TransferBackend for ExternalBackend {
    fn name(&self) -> &str {
        self.program.tool.name()
    }

    async fn transfer(
        &self,
        url: &str,
        output: &Path,
        credentials: &SessionCredentials,
    ) -> Result<(), DownloadError> {
        let args = self
            .program
            .tool
            .build_args(url, output, &credentials.cookie_header());
        info!("使用 {} 下载 {} -> {}", self.name(), url, output.display());
        debug!("执行 {}: {:?}", self.program.bin.display(), args);

        // 取消时 future 被丢弃，子进程随之结束
        let status = Command::new(&self.program.bin)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await?;

        if status.success() {
            Ok(())
        } else {
            warn!("{} 下载失败: {} ({})", self.name(), url, status);
            Err(DownloadError::ExternalFailed {
                program: self.name().to_string(),
                code: status.code(),
            })
        }
    }
}
