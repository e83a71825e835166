use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("索引文件不是有效的XML: {0}")]
    InvalidXml(String),
    #[error("无效的视频地址 {0}: {1}")]
    InvalidSource(String, String),
}
