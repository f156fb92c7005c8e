use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Coursera 课程资料下载器
#[derive(Parser, Debug)]
#[command(name = "coursera-dl")]
#[command(version = "1.0")]
#[command(author = "rpeng252@gmail.com")]
#[command(about = "下载 Coursera 课程的讲座视频和资料", long_about = None)]
#[command(group(
    ArgGroup::new("external")
        .args(["wget_bin", "curl_bin", "aria2_bin", "axel_bin"])
        .multiple(false)
))]
pub struct Cli {
    /// 课程名 (例如 "nlp")
    #[arg(required = true, value_name = "CLASS")]
    pub class_names: Vec<String>,

    /// 额外的课程名，可以重复使用
    #[arg(long, value_name = "CLASS")]
    pub add_class: Vec<String>,

    /// Netscape 格式的 cookies.txt 路径
    #[arg(short = 'c', long, value_name = "FILE")]
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub cookies_file: Option<PathBuf>,

    /// Coursera 账号
    #[arg(short = 'u', long)]
    pub username: Option<String>,

    /// Coursera 密码，不提供时会在终端提示输入
    #[arg(short = 'p', long)]
    pub password: Option<String>,

    /// 从 netrc 读取账号密码，不指定路径时使用默认位置
    #[arg(short = 'n', long, value_name = "PATH", num_args = 0..=1)]
    pub netrc: Option<Option<PathBuf>>,

    /// 要下载的格式，用空格分隔 (例如 "mp4 pdf")
    #[arg(short = 'f', long, default_value = "all")]
    pub formats: String,

    /// 只下载名字匹配该正则的章节
    #[arg(long, value_name = "REGEX")]
    pub section_filter: Option<String>,

    /// 只下载名字匹配该正则的讲座
    #[arg(long, value_name = "REGEX")]
    pub lecture_filter: Option<String>,

    /// 使用 wget 下载
    #[arg(short = 'w', long, value_name = "BIN", num_args = 0..=1, default_missing_value = "wget")]
    pub wget_bin: Option<PathBuf>,

    /// 使用 curl 下载
    #[arg(long, value_name = "BIN", num_args = 0..=1, default_missing_value = "curl")]
    pub curl_bin: Option<PathBuf>,

    /// 使用 aria2c 下载
    #[arg(long, value_name = "BIN", num_args = 0..=1, default_missing_value = "aria2c")]
    pub aria2_bin: Option<PathBuf>,

    /// 使用 axel 下载
    #[arg(long, value_name = "BIN", num_args = 0..=1, default_missing_value = "axel")]
    pub axel_bin: Option<PathBuf>,

    /// 覆盖已经下载的文件
    #[arg(short = 'o', long)]
    pub overwrite: bool,

    /// 课程大纲页面的本地缓存，不存在时会在下载后写入
    #[arg(short = 'l', long, value_name = "FILE")]
    pub local_page: Option<PathBuf>,

    /// 不下载，只创建空文件
    #[arg(long)]
    pub skip_download: bool,

    /// 保存目录
    #[arg(long, value_name = "DIR", default_value = ".")]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub path: PathBuf,

    /// 章节目录名前加上课程名
    #[arg(long)]
    pub verbose_dirs: bool,

    /// 输出调试日志
    #[arg(long, conflicts_with = "quiet")]
    pub debug: bool,

    /// 只输出错误
    #[arg(long)]
    pub quiet: bool,

    /// 倒序处理章节
    #[arg(short = 'r', long = "reverse-sections")]
    pub reverse: bool,

    /// 超过多少天没有新内容就认为课程已结束
    #[arg(long, value_name = "DAYS", default_value_t = 30)]
    pub complete_after_days: u64,
}
