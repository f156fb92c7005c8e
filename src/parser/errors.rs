use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("讲座缺少 mp4 资源: {section}/{lecture}")]
    MissingVideo { section: String, lecture: String },

    #[error("找不到章节标题")]
    MissingSectionTitle,

    #[error("找不到讲座标题 (章节 {0})")]
    MissingLectureTitle(String),
}
