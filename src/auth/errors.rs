use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("无效的站点地址: {0}")]
    InvalidUrl(String),

    #[error("无效的Cookie: {0}")]
    InvalidCookie(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
