use std::path::PathBuf;

/// 一个待下载的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub url: String,
    pub output_path: PathBuf,
    pub format: String,
}

/// 一门课程下载结束后的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub downloaded: usize,
    pub placeholders: usize,
    pub failed: usize,
    pub skipped: usize,
    pub completed: bool, // 课程看起来已经结束
}
