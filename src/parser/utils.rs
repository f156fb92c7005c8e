use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FORMAT_PATTERN: Regex = Regex::new(r"(?:\.|format=)(\w+)(?:\?.*)?$").unwrap();
}

const EXTRA_VALID_CHARS: &str = "-_.()";

// 去掉最后一个 "(" 开始的后缀，一般是 "(12 min)" 这样的时长标注
fn strip_paren_suffix(s: &str) -> &str {
    match s.rfind('(') {
        Some(pos) => &s[..pos],
        None => s,
    }
}

fn clean_once(s: &str) -> String {
    strip_paren_suffix(s)
        .trim()
        .replace(':', "-")
        .replace(' ', "_")
        .replace("nbsp", "")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || EXTRA_VALID_CHARS.contains(*c))
        .collect()
}

/// 把抓取到的文本转换成安全的文件名片段。
///
/// 结果只包含 ASCII 字母、数字和 `-_.()`，重复调用结果不变。
pub fn clean_filename(s: &str) -> String {
    let mut current = clean_once(s);
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// 从资源链接中提取格式，如 `.../download.mp4?x=1` 得到 `mp4`
pub fn extract_format(href: &str) -> Option<String> {
    FORMAT_PATTERN
        .captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
