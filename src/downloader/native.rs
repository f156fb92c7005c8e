use std::path::Path;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::backend::TransferBackend;
use super::bandwidth::BandwidthCalc;
use super::error::DownloadError;
use crate::auth::SessionCredentials;
use crate::common::client::CourseraClient;

/// 每次写入文件并统计速度的块大小
const CHUNK_SIZE: usize = 1024 * 1024;

/// 内置的流式下载
#[derive(Debug, Clone)]
pub struct NativeBackend {
    client: CourseraClient,
}

impl NativeBackend {
    pub fn new(client: CourseraClient) -> Self {
        Self { client }
    }

    fn spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb
    }
}

#[async_trait]
impl TransferBackend for NativeBackend {
    fn name(&self) -> &str {
        "native"
    }

    async fn transfer(
        &self,
        url: &str,
        output: &Path,
        credentials: &SessionCredentials,
    ) -> Result<(), DownloadError> {
        info!("下载 {} -> {}", url, output.display());
        let response = self.client.get_with_credentials(url, credentials).await?;

        let status = response.status();
        if !status.is_success() {
            warn!("文件可能已经不在服务器上，跳过: {} ({})", url, status);
            return Err(DownloadError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let mut file = tokio::fs::File::create(output).await?;
        let pb = Self::spinner();
        let mut bw = BandwidthCalc::default();
        let mut bytes_read = 0u64;

        // 按块统计进度和速度
        let copied = copy_in_chunks(response.bytes_stream(), &mut file, CHUNK_SIZE, |len| {
            bytes_read += len as u64;
            bw.received(len);
            pb.set_message(format!("{} bytes read{}", bytes_read, bw.render()));
            pb.tick();
        })
        .await;

        if let Err(e) = copied {
            pb.abandon_with_message("下载中断");
            return Err(e);
        }

        pb.finish_and_clear();
        debug!("完成 {} ({} 字节)", output.display(), bytes_read);
        Ok(())
    }
}

/// 把数据流凑成固定大小的块依次写入，最后一块可能较小。
///
/// 每写完一块调用一次 `on_chunk`，返回写入的总字节数。
async fn copy_in_chunks<S, B, E, W, F>(
    mut stream: S,
    writer: &mut W,
    chunk_size: usize,
    mut on_chunk: F,
) -> Result<u64, DownloadError>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    DownloadError: From<E>,
    W: AsyncWrite + Unpin,
    F: FnMut(usize),
{
    let mut buf = Vec::with_capacity(chunk_size);
    let mut total = 0u64;

    while let Some(data) = stream.next().await {
        let bytes = data?;
        let mut data = bytes.as_ref();
        while !data.is_empty() {
            let take = (chunk_size - buf.len()).min(data.len());
            buf.extend_from_slice(&data[..take]);
            data = &data[take..];

            if buf.len() == chunk_size {
                writer.write_all(&buf).await?;
                total += buf.len() as u64;
                on_chunk(buf.len());
                buf.clear();
            }
        }
    }

    if !buf.is_empty() {
        writer.write_all(&buf).await?;
        total += buf.len() as u64;
        on_chunk(buf.len());
    }
    writer.flush().await?;
    Ok(total)
}
