use thiserror::Error;

use crate::auth::SessionError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("网络请求失败: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("HTTP 状态码 {0}，URL: {1}")]
    Status(reqwest::StatusCode, String),

    #[error("接口返回失败: {0}")]
    Rejected(String),

    #[error("响应解析失败: {0}")]
    InvalidResponse(String),

    #[error("站点配置解密失败: {0}")]
    Decrypt(String),

    #[error("无效的URL: {0}")]
    InvalidUrl(String),

    #[error("会话无效: {0}")]
    Session(#[from] SessionError),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}
