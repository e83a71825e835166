use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use super::core::DownloadTask;
use super::error::TaskError;
use super::index::IndexTask;
use super::models::ResourceClass;
use super::progress::TaskContext;
use crate::post_process::extractor::{ExtractTask, ExtractorCommand};

// -----------------------------------------------------------------------------------------------
#[async_trait]
pub trait TaskTrait: Send + Sync {
    // 任务所属的资源类别，同一种任务总是落在同一个池
    fn resource_class(&self) -> ResourceClass;
    // 用于展示的名称，任务存续期间不变
    fn display_name(&self) -> String;
    // 执行任务，后续任务通过 ctx.emit 立即提交
    async fn execute(&self, ctx: &TaskContext) -> Result<(), TaskError>;
}

// -----------------------------------------------------------------------------------------------

/// 引擎可调度的全部任务种类
///
/// 任务在构造后不可变，携带执行所需的全部参数，不持有引擎的引用。
#[derive(Debug, Clone)]
pub enum Task {
    Index(IndexTask),
    Download(DownloadTask),
    Extract(ExtractTask),
}

impl Task {
    pub fn resource_class(&self) -> ResourceClass {
        match self {
            Task::Index(task) => task.resource_class(),
            Task::Download(task) => task.resource_class(),
            Task::Extract(task) => task.resource_class(),
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Task::Index(task) => task.display_name(),
            Task::Download(task) => task.display_name(),
            Task::Extract(task) => task.display_name(),
        }
    }

    pub async fn execute(&self, ctx: &TaskContext) -> Result<(), TaskError> {
        match self {
            Task::Index(task) => task.execute(ctx).await,
            Task::Download(task) => task.execute(ctx).await,
            Task::Extract(task) => task.execute(ctx).await,
        }
    }
}

impl From<IndexTask> for Task {
    fn from(task: IndexTask) -> Self {
        Task::Index(task)
    }
}

impl From<DownloadTask> for Task {
    fn from(task: DownloadTask) -> Self {
        Task::Download(task)
    }
}

impl From<ExtractTask> for Task {
    fn from(task: ExtractTask) -> Self {
        Task::Extract(task)
    }
}

// -----------------------------------------------------------------------------------------------

/// 索引文件中声明的视频源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Vga, // 屏幕录制
    Video1,
    Video2,
    Video3,
}

impl MediaType {
    pub const ALL: [MediaType; 4] = [
        MediaType::Vga,
        MediaType::Video1,
        MediaType::Video2,
        MediaType::Video3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Vga => "VGA",
            MediaType::Video1 => "Video1",
            MediaType::Video2 => "Video2",
            MediaType::Video3 => "Video3",
        }
    }

    pub fn is_screen_recording(&self) -> bool {
        *self == MediaType::Vga
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaType::ALL
            .into_iter()
            .find(|media_type| media_type.as_str() == s)
            .ok_or_else(|| format!("不支持的视频类型: {}，可选: VGA, Video1, Video2, Video3", s))
    }
}

/// 用户选择的下载选项，随任务一路向下传递
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub type_filter: Vec<MediaType>,
    pub extract_slides: bool,
    pub extractor: ExtractorCommand,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            type_filter: MediaType::ALL.to_vec(),
            extract_slides: true,
            extractor: ExtractorCommand::default(),
        }
    }
}
