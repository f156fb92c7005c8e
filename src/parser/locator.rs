use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

lazy_static! {
    static ref SECTION_HEADER: Selector =
        Selector::parse(r#"[class^="course-item-list-header"]"#).unwrap();
    static ref LECTURE_ITEM: Selector = Selector::parse("li").unwrap();
    static ref ANCHOR: Selector = Selector::parse("a").unwrap();
    static ref LINK: Selector = Selector::parse("a[href]").unwrap();
}

/// 在大纲页面中定位章节和讲座的方式。
///
/// 页面结构变化时只需要换一个实现，解析流程保持不变。
pub trait SyllabusLocator {
    fn locate_sections<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>>;

    fn locate_lectures_for<'a>(&self, section: ElementRef<'a>) -> Vec<ElementRef<'a>>;

    fn section_title(&self, section: ElementRef<'_>) -> Option<String>;

    fn lecture_title(&self, lecture: ElementRef<'_>) -> Option<String>;

    fn resource_links<'a>(&self, lecture: ElementRef<'a>) -> Vec<&'a str>;
}

/// Coursera 课程大纲页面的结构
#[derive(Debug, Clone, Copy, Default)]
pub struct CourseraLocator;

// 元素自身的文本节点，不包含子元素里的文本
fn own_text(element: ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| text.to_string())
        .collect()
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn title_of(element: ElementRef<'_>) -> Option<String> {
    non_blank(own_text(element)).or_else(|| non_blank(element.text().collect()))
}

impl SyllabusLocator for CourseraLocator {
    fn locate_sections<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        doc.select(&SECTION_HEADER).collect()
    }

    // 章节标题后面紧跟的元素是讲座列表
    fn locate_lectures_for<'a>(&self, section: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        section
            .next_siblings()
            .find_map(ElementRef::wrap)
            .map(|list| list.select(&LECTURE_ITEM).collect())
            .unwrap_or_default()
    }

    fn section_title(&self, section: ElementRef<'_>) -> Option<String> {
        let heading = section.children().find_map(ElementRef::wrap)?;
        title_of(heading)
    }

    fn lecture_title(&self, lecture: ElementRef<'_>) -> Option<String> {
        let anchor = lecture.select(&ANCHOR).next()?;
        title_of(anchor)
    }

    fn resource_links<'a>(&self, lecture: ElementRef<'a>) -> Vec<&'a str> {
        lecture
            .select(&LINK)
            .filter_map(|a| a.value().attr("href"))
            .collect()
    }
}
