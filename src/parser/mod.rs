pub mod errors;
pub mod locator;
pub mod models;
pub mod utils;

use std::collections::BTreeMap;

use scraper::Html;
use tracing::{debug, error, info};

use errors::ParseError;
use locator::{CourseraLocator, SyllabusLocator};
use models::{Course, Lecture, Section};
use utils::{clean_filename, extract_format};

/// 每个讲座都必须提供的格式
pub const PRIMARY_FORMAT: &str = "mp4";

/// 课程大纲解析器
pub struct SyllabusParser<L = CourseraLocator> {
    locator: L,
    reverse: bool,
}

impl SyllabusParser {
    pub fn new(reverse: bool) -> Self {
        Self::with_locator(CourseraLocator, reverse)
    }
}

impl<L: SyllabusLocator> SyllabusParser<L> {
    pub fn with_locator(locator: L, reverse: bool) -> Self {
        Self { locator, reverse }
    }

    // 解析入口
    pub fn parse(&self, page: &str) -> Result<Course, ParseError> {
        let doc = Html::parse_document(page);
        let mut parsed = Vec::new();

        for header in self.locator.locate_sections(&doc) {
            let title = self
                .locator
                .section_title(header)
                .ok_or(ParseError::MissingSectionTitle)?;
            let section_name = clean_filename(&title);
            info!("{}", section_name);

            let mut lectures = Vec::new();
            for item in self.locator.locate_lectures_for(header) {
                let title = self
                    .locator
                    .lecture_title(item)
                    .ok_or_else(|| ParseError::MissingLectureTitle(section_name.clone()))?;
                let lecture_name = clean_filename(&title);
                info!("  {}", lecture_name);

                let mut resources = BTreeMap::new();
                for href in self.locator.resource_links(item) {
                    let format = extract_format(href);
                    debug!("    {:?} {}", format, href);
                    if let Some(format) = format {
                        resources.insert(format, href.to_string());
                    }
                }

                if !resources.contains_key(PRIMARY_FORMAT) {
                    error!("讲座缺少视频，可能是隐藏内容: {}", lecture_name);
                    return Err(ParseError::MissingVideo {
                        section: section_name,
                        lecture: lecture_name,
                    });
                }

                lectures.push(Lecture {
                    name: lecture_name,
                    index: lectures.len() + 1,
                    resources,
                });
            }

            parsed.push((section_name, lectures));
        }

        info!(
            "页面中找到 {} 个章节，{} 个讲座",
            parsed.len(),
            parsed.iter().map(|(_, l)| l.len()).sum::<usize>()
        );

        if parsed.is_empty() {
            error!("没有找到任何章节，可能是 Cookie 无效或课程名错误");
            return Ok(Course::default());
        }

        if self.reverse {
            parsed.reverse();
        }

        // 章节编号按最终的展示顺序分配
        let sections = parsed
            .into_iter()
            .enumerate()
            .map(|(i, (name, lectures))| Section {
                name,
                index: i + 1,
                lectures,
            })
            .collect();

        Ok(Course::new(sections))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(title: &str, lectures: &[(&str, &[&str])]) -> String {
        let items: String = lectures
            .iter()
            .map(|(name, links)| {
                let anchors: String = links
                    .iter()
                    .map(|href| format!(r#"<a href="{}">dl</a>"#, href))
                    .collect();
                format!(r#"<li><a class="lecture-link" href="/view">{}</a>{}</li>"#, name, anchors)
            })
            .collect();
        format!(
            r#"<div class="course-item-list-header"><h3><span></span>{}</h3></div>
               <ul class="course-item-list-section-list">{}</ul>"#,
            title, items
        )
    }

    fn page(sections: &[String]) -> String {
        format!("<html><body>{}</body></html>", sections.concat())
    }

    #[test]
    fn keeps_page_order() {
        let html = page(&[
            section(
                "Week 1",
                &[
                    ("Intro (5 min)", &["a/intro.mp4"]),
                    ("Setup", &["a/setup.mp4", "a/setup.pdf"]),
                ],
            ),
            section("Week 2", &[("Deep Dive", &["b/deep.mp4?x=1"])]),
        ]);

        let course = SyllabusParser::new(false).parse(&html).unwrap();
        let sections = course.sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name, "Week_1");
        assert_eq!(sections[0].index, 1);
        assert_eq!(sections[1].name, "Week_2");

        let lectures = &sections[0].lectures;
        assert_eq!(lectures[0].name, "Intro");
        assert_eq!(lectures[1].name, "Setup");
        assert_eq!(lectures[1].index, 2);
        assert_eq!(lectures[1].resource("pdf"), Some("a/setup.pdf"));
        assert_eq!(course.lecture_count(), 3);
    }

    #[test]
    fn reverse_flips_sections_only() {
        let html = page(&[
            section("First", &[("A", &["a.mp4"]), ("B", &["b.mp4"])]),
            section("Second", &[("C", &["c.mp4"])]),
        ]);

        let course = SyllabusParser::new(true).parse(&html).unwrap();
        let sections = course.sections();
        assert_eq!(sections[0].name, "Second");
        assert_eq!(sections[0].index, 1);
        assert_eq!(sections[1].name, "First");
        assert_eq!(sections[1].index, 2);

        let names: Vec<_> = sections[1].lectures.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn rejects_lecture_without_video() {
        let html = page(&[section(
            "Week 1",
            &[("Ok", &["ok.mp4"]), ("Slides only", &["slides.pdf"])],
        )]);

        let err = SyllabusParser::new(false).parse(&html).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingVideo {
                section: "Week_1".to_string(),
                lecture: "Slides_only".to_string(),
            }
        );
    }

    #[test]
    fn empty_page_gives_empty_course() {
        let course = SyllabusParser::new(false)
            .parse("<html><body><p>Please log in</p></body></html>")
            .unwrap();
        assert!(course.is_empty());
    }

    #[test]
    fn keeps_sections_without_lectures() {
        let html = page(&[section("Empty", &[]), section("Full", &[("X", &["x.mp4"])])]);

        let course = SyllabusParser::new(false).parse(&html).unwrap();
        assert_eq!(course.sections().len(), 2);
        assert!(course.sections()[0].lectures.is_empty());
    }

    #[test]
    fn duplicate_format_last_wins_and_unknown_links_are_skipped() {
        let html = page(&[section(
            "W",
            &[("L", &["first.mp4", "second.mp4", "javascript:void(0)"])],
        )]);

        let course = SyllabusParser::new(false).parse(&html).unwrap();
        let lecture = &course.sections()[0].lectures[0];
        assert_eq!(lecture.resource("mp4"), Some("second.mp4"));
        assert_eq!(lecture.resources.len(), 1);
    }
}
