pub mod auth;
pub mod common;
pub mod downloader;
pub mod parser;
pub mod post_process;
