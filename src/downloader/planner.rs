use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use regex::Regex;
use tracing::{debug, info};

use super::models::DownloadTask;
use crate::parser::models::{Course, Lecture, Section};

/// 格式列表中包含它时下载全部格式
pub const ALL_FORMATS: &str = "all";

/// 超过这么久没有新文件，就认为课程已经结束
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub class_name: String,
    pub formats: Vec<String>,
    pub section_filter: Option<Regex>,
    pub lecture_filter: Option<Regex>,
    pub output_root: PathBuf,
    pub verbose_dirs: bool, // 目录名前加上大写的课程名
    pub overwrite: bool,
    pub stale_after: Duration,
}

impl PlanOptions {
    pub fn new(class_name: impl Into<String>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            class_name: class_name.into(),
            formats: vec![ALL_FORMATS.to_string()],
            section_filter: None,
            lecture_filter: None,
            output_root: output_root.into(),
            verbose_dirs: false,
            overwrite: false,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }

    pub fn wants_format(&self, format: &str) -> bool {
        self.formats.iter().any(|f| f == format || f == ALL_FORMATS)
    }
}

pub fn section_dir_name(class_name: &str, section: &Section, verbose_dirs: bool) -> String {
    let dir = format!("{:02}_{}", section.index, section.name);
    if verbose_dirs {
        format!("{}_{}", class_name.to_uppercase(), dir)
    } else {
        dir
    }
}

pub fn resource_file_name(lecture: &Lecture, format: &str) -> String {
    format!("{:02}_{}.{}", lecture.index, lecture.name, format)
}

/// 记录最近一次更新的时间，用来判断课程是否已经结束
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionTracker {
    last_update: Option<SystemTime>,
    stale_after: Duration,
}

impl CompletionTracker {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            last_update: None,
            stale_after,
        }
    }

    pub fn observe(&mut self, time: SystemTime) {
        self.last_update = Some(match self.last_update {
            Some(prev) => prev.max(time),
            None => time,
        });
    }

    pub fn last_update(&self) -> Option<SystemTime> {
        self.last_update
    }

    // 没有观察到任何文件时不算结束
    pub fn is_complete_at(&self, now: SystemTime) -> bool {
        self.last_update
            .and_then(|t| now.duration_since(t).ok())
            .is_some_and(|age| age > self.stale_after)
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete_at(SystemTime::now())
    }
}

#[derive(Debug, Clone)]
pub struct DownloadPlan {
    pub tasks: Vec<DownloadTask>,
    pub completion: CompletionTracker,
    pub skipped: usize, // 已存在而跳过的文件数
}

/// 根据过滤条件和已有文件生成下载任务
pub struct DownloadPlanner {
    options: PlanOptions,
}

impl DownloadPlanner {
    pub fn new(options: PlanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PlanOptions {
        &self.options
    }

    pub async fn plan(&self, course: &Course) -> DownloadPlan {
        let opts = &self.options;
        let class_root = opts.output_root.join(&opts.class_name);
        let mut plan = DownloadPlan {
            tasks: Vec::new(),
            completion: CompletionTracker::new(opts.stale_after),
            skipped: 0,
        };

        for section in course.sections() {
            if let Some(filter) = &opts.section_filter {
                if !filter.is_match(&section.name) {
                    debug!("章节不匹配过滤条件 {}: {}", filter, section.name);
                    continue;
                }
            }
            let section_dir =
                class_root.join(section_dir_name(&opts.class_name, section, opts.verbose_dirs));

            for lecture in &section.lectures {
                if let Some(filter) = &opts.lecture_filter {
                    if !filter.is_match(&lecture.name) {
                        debug!("讲座不匹配过滤条件 {}: {}", filter, lecture.name);
                        continue;
                    }
                }

                for (format, url) in &lecture.resources {
                    if !opts.wants_format(format) {
                        continue;
                    }
                    let output_path = section_dir.join(resource_file_name(lecture, format));

                    if !opts.overwrite {
                        if let Ok(meta) = tokio::fs::metadata(&output_path).await {
                            info!("{} 已经下载过", output_path.display());
                            if let Ok(modified) = meta.modified() {
                                plan.completion.observe(modified);
                            }
                            plan.skipped += 1;
                            continue;
                        }
                    }

                    plan.tasks.push(DownloadTask {
                        url: url.clone(),
                        output_path,
                        format: format.clone(),
                    });
                }
            }
        }

        debug!(
            "生成 {} 个下载任务，跳过 {} 个已有文件",
            plan.tasks.len(),
            plan.skipped
        );
        plan
    }
}
