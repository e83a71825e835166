use thiserror::Error;

use crate::common::client::error::ApiError;

/// 任务执行过程中的错误，由工作线程捕获并记录到任务记录中
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("资源不存在: {0}")]
    NotFound(String),

    #[error("没有可用内容: {0}")]
    EmptyResult(String),

    #[error("传输失败: {0}")]
    Transfer(String),

    #[error("子进程错误: {0}")]
    Subprocess(String),

    #[error("响应格式异常: {0}")]
    UnexpectedFormat(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ApiError> for TaskError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Reqwest(e) => TaskError::Transfer(e.to_string()),
            ApiError::Status(reqwest::StatusCode::NOT_FOUND, url) => {
                TaskError::NotFound(format!("远程资源不存在: {}", url))
            }
            ApiError::Status(status, url) => {
                TaskError::Transfer(format!("HTTP 状态码 {}，URL: {}", status, url))
            }
            ApiError::Rejected(msg) => TaskError::NotFound(msg),
            ApiError::InvalidResponse(msg) => TaskError::UnexpectedFormat(msg),
            ApiError::Decrypt(msg) => TaskError::UnexpectedFormat(msg),
            ApiError::InvalidUrl(msg) => TaskError::UnexpectedFormat(msg),
            ApiError::Session(e) => TaskError::UnexpectedFormat(e.to_string()),
        }
    }
}

impl From<crate::parser::errors::ParseError> for TaskError {
    fn from(err: crate::parser::errors::ParseError) -> Self {
        TaskError::UnexpectedFormat(err.to_string())
    }
}
