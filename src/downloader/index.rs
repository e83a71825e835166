use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info};

use super::core::DownloadTask;
use super::error::TaskError;
use super::models::ResourceClass;
use super::progress::TaskContext;
use super::task::{DownloadOptions, TaskTrait};
use crate::auth::SessionCookies;
use crate::common::client::client::SmartclassClient;
use crate::parser::index::{parse_sources, resolve_source};

/// 分段索引文件在本地保存的文件名
pub const INDEX_FILE_NAME: &str = "index.xml";

/// 获取一次录播的索引，为每个选中的视频源产生一个 [`DownloadTask`]
///
/// 只有一个分段时文件直接写在目标目录下；多个分段时每段放进
/// `Seg1`、`Seg2`…… 子目录。下游工具依赖这一目录规则。
#[derive(Debug, Clone)]
pub struct IndexTask {
    pub title: String,
    pub video_id: String,
    pub destination: PathBuf,
    pub session: SessionCookies,
    pub options: DownloadOptions,
}

impl IndexTask {
    pub fn new(
        title: impl Into<String>,
        video_id: impl Into<String>,
        destination: PathBuf,
        session: SessionCookies,
        options: DownloadOptions,
    ) -> Self {
        Self {
            title: title.into(),
            video_id: video_id.into(),
            destination,
            session,
            options,
        }
    }
}

#[async_trait]
impl TaskTrait for IndexTask {
    fn resource_class(&self) -> ResourceClass {
        ResourceClass::Index
    }

    fn display_name(&self) -> String {
        format!("{} - Index", self.title)
    }

    async fn execute(&self, ctx: &TaskContext) -> Result<(), TaskError> {
        let client = SmartclassClient::from_session(&self.session)?;
        let video_info = client
            .get_video_info_by_id(&self.video_id)
            .await?
            .ok_or_else(|| TaskError::NotFound(format!("找不到视频信息: {}", self.video_id)))?;

        if video_info.segments.is_empty() {
            return Err(TaskError::EmptyResult(format!(
                "视频 {} 没有任何分段",
                self.video_id
            )));
        }

        let total = video_info.segments.len();
        let single_segment = total == 1;
        debug!("视频 {} 共 {} 个分段", self.video_id, total);

        for (index, segment) in video_info.segments.iter().enumerate() {
            let seq = index as u32 + 1;
            ctx.report_progress(Some("Indexing"), Some(index as f64 / total as f64));

            let index_xml = client.get_bytes(&segment.index_file_uri).await?;

            let segment_dir = if single_segment {
                self.destination.clone()
            } else {
                self.destination.join(format!("Seg{}", seq))
            };
            tokio::fs::create_dir_all(&segment_dir).await?;
            tokio::fs::write(segment_dir.join(INDEX_FILE_NAME), &index_xml).await?;

            let sources = parse_sources(&index_xml, &self.options.type_filter)?;
            debug!("分段 {} 选中 {} 个视频源", seq, sources.len());

            for (media_type, src) in sources {
                let remote_url = resolve_source(&segment.index_file_uri, &src)?;
                ctx.emit(DownloadTask::new(
                    self.title.clone(),
                    media_type,
                    (!single_segment).then_some(seq),
                    remote_url,
                    segment_dir.join(format!("{}.mp4", media_type)),
                    self.options.clone(),
                ));
            }
        }

        info!("索引完成: {} ({} 个分段)", self.title, total);
        Ok(())
    }
}
