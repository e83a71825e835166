use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

/// 把课程名之类的文本变成可以当作目录名的字符串
///
/// 替换 `/ \ : * ? " < > |` 和控制字符，去掉首尾空白及结尾的点。
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let sanitized = sanitized.trim().trim_end_matches('.').trim_end();

    if sanitized.is_empty() || sanitized == "." {
        return "_".to_string();
    }
    sanitized.to_string()
}

/// 录播时间段标签
///
/// 同一天：`20240301 0800_0935`；跨天：`202403012330_202403020105`
pub fn time_label(start: NaiveDateTime, stop: NaiveDateTime) -> String {
    if start.date() == stop.date() {
        format!("{}_{}", start.format("%Y%m%d %H%M"), stop.format("%H%M"))
    } else {
        format!(
            "{}_{}",
            start.format("%Y%m%d%H%M"),
            stop.format("%Y%m%d%H%M")
        )
    }
}

/// 一次录播的任务标题，如 `大学物理 - 20240301 0800_0935`
pub fn video_title(course_name: &str, start: NaiveDateTime, stop: NaiveDateTime) -> String {
    format!("{} - {}", course_name, time_label(start, stop))
}

/// 一次录播的本地目录：`<output>/<课程名>/<时间段>`
pub fn video_destination(
    output_dir: &Path,
    course_name: &str,
    start: NaiveDateTime,
    stop: NaiveDateTime,
) -> PathBuf {
    output_dir
        .join(sanitize_filename(course_name))
        .join(time_label(start, stop))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn replaces_reserved_characters() {
        assert_eq!(sanitize_filename("C/C++: 程序设计?"), "C_C++_ 程序设计_");
        assert_eq!(sanitize_filename("  线性代数.. "), "线性代数");
        assert_eq!(sanitize_filename(""), "_");
        assert_eq!(sanitize_filename("..."), "_");
    }

    #[test]
    fn labels_same_day_and_overnight_sessions() {
        assert_eq!(
            time_label(at("2024-03-01 08:00:00"), at("2024-03-01 09:35:00")),
            "20240301 0800_0935"
        );
        assert_eq!(
            time_label(at("2024-03-01 23:30:00"), at("2024-03-02 01:05:00")),
            "202403012330_202403020105"
        );
    }

    #[test]
    fn destination_uses_course_and_label() {
        let start = at("2024-03-01 08:00:00");
        let stop = at("2024-03-01 09:35:00");
        assert_eq!(
            video_title("数据结构/算法", start, stop),
            "数据结构/算法 - 20240301 0800_0935"
        );
        assert_eq!(
            video_destination(Path::new("out"), "数据结构/算法", start, stop),
            Path::new("out").join("数据结构_算法").join("20240301 0800_0935")
        );
    }
}
