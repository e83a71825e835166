use url::Url;
use tracing::debug;

use super::errors::ParseError;
use crate::downloader::task::MediaType;

/// 从分段索引文件中找出需要下载的视频源
///
/// 索引文件形如 `<Info><VGA Src="..."/><Video1 Src="..."/></Info>`。
/// 按 VGA、Video1、Video2、Video3 的顺序，只保留 `type_filter` 中的类型，
/// 跳过 `Src` 为空的节点。根节点不是 `Info` 时没有任何视频源。
pub fn parse_sources(
    xml: &[u8],
    type_filter: &[MediaType],
) -> Result<Vec<(MediaType, String)>, ParseError> {
    let xml = xml.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(xml);
    let text = String::from_utf8_lossy(xml);

    let parse_options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(&text, parse_options)
        .map_err(|e| ParseError::InvalidXml(e.to_string()))?;

    let root = doc.root_element();
    if root.tag_name().name() != "Info" {
        debug!("索引文件根节点为 {}，没有视频源", root.tag_name().name());
        return Ok(Vec::new());
    }

    let mut sources = Vec::new();
    for media_type in MediaType::ALL {
        if !type_filter.contains(&media_type) {
            continue;
        }
        for node in root
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == media_type.as_str())
        {
            if let Some(src) = node.attribute("Src").filter(|src| !src.is_empty()) {
                sources.push((media_type, src.to_string()));
            }
        }
    }
    Ok(sources)
}

// 视频源可能是相对地址，以索引文件地址为基准解析
pub fn resolve_source(index_url: &str, src: &str) -> Result<String, ParseError> {
    let base = Url::parse(index_url)
        .map_err(|e| ParseError::InvalidSource(index_url.to_string(), e.to_string()))?;
    base.join(src)
        .map(String::from)
        .map_err(|e| ParseError::InvalidSource(src.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Info>
  <VGA Src="VGA.mp4" />
  <Video1 Src="" />
  <Video2 Src="http://cdn.example.com/v2.mp4" />
  <Video3 />
</Info>"#;

    #[test]
    fn keeps_non_empty_sources_in_vocabulary_order() {
        let sources = parse_sources(INDEX.as_bytes(), &MediaType::ALL).unwrap();
        assert_eq!(
            sources,
            vec![
                (MediaType::Vga, "VGA.mp4".to_string()),
                (MediaType::Video2, "http://cdn.example.com/v2.mp4".to_string()),
            ]
        );
    }

    #[test]
    fn applies_type_filter() {
        let sources = parse_sources(INDEX.as_bytes(), &[MediaType::Video2]).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].0, MediaType::Video2);
        assert!(parse_sources(INDEX.as_bytes(), &[]).unwrap().is_empty());
    }

    #[test]
    fn other_roots_have_no_sources_and_garbage_fails() {
        assert!(parse_sources(b"<Other><VGA Src=\"a\"/></Other>", &MediaType::ALL)
            .unwrap()
            .is_empty());
        assert!(matches!(
            parse_sources(b"<Info><VGA", &MediaType::ALL),
            Err(ParseError::InvalidXml(_))
        ));
    }

    #[test]
    fn resolves_relative_sources_against_index_url() {
        assert_eq!(
            resolve_source("http://host/video/abc/index.xml", "VGA.mp4").unwrap(),
            "http://host/video/abc/VGA.mp4"
        );
        assert_eq!(
            resolve_source("http://host/video/abc/index.xml", "http://cdn/x.mp4").unwrap(),
            "http://cdn/x.mp4"
        );
        assert!(resolve_source("not a url", "VGA.mp4").is_err());
    }
}
