use std::path::Path;

use async_trait::async_trait;
use tracing::{info, warn};

use super::error::DownloadError;
use super::external::{ExternalBackend, ExternalProgram};
use super::native::NativeBackend;
use crate::auth::SessionCredentials;
use crate::common::client::CourseraClient;

/// 把一个地址下载到一个文件
#[async_trait]
pub trait TransferBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn transfer(
        &self,
        url: &str,
        output: &Path,
        credentials: &SessionCredentials,
    ) -> Result<(), DownloadError>;
}

/// 按 wget、curl、aria2、axel 的顺序选择第一个可用的外部程序，都没有时使用内置下载
pub async fn select_backend(
    programs: &[ExternalProgram],
    client: CourseraClient,
) -> Box<dyn TransferBackend> {
    let mut candidates = programs.to_vec();
    candidates.sort_by_key(|p| p.tool);

    for program in candidates {
        if program.is_available().await {
            info!("使用外部下载程序: {}", program.bin.display());
            return Box::new(ExternalBackend::new(program));
        }
        warn!(
            "找不到 {}: {}，尝试下一个",
            program.tool.name(),
            program.bin.display()
        );
    }

    info!("使用内置下载器");
    Box::new(NativeBackend::new(client))
}
