use std::collections::BTreeMap;

/// 一个讲座：格式到下载地址的映射，按格式名排序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lecture {
    pub name: String,
    pub index: usize, // 章节内从 1 开始
    pub resources: BTreeMap<String, String>,
}

impl Lecture {
    pub fn resource(&self, format: &str) -> Option<&str> {
        self.resources.get(format).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub index: usize, // 展示顺序，从 1 开始
    pub lectures: Vec<Lecture>,
}

/// 解析后的课程，创建后不再修改
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Course {
    sections: Vec<Section>,
}

impl Course {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn lecture_count(&self) -> usize {
        self.sections.iter().map(|s| s.lectures.len()).sum()
    }
}
