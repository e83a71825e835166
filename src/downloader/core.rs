use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::error::TaskError;
use super::models::ResourceClass;
use super::progress::{TaskContext, TaskReporter};
use super::task::{DownloadOptions, MediaType, TaskTrait};
use crate::common::client::client::SmartclassClient;
use crate::common::utils::part_path;
use crate::post_process::extractor::ExtractTask;

/// 下载单个视频文件
///
/// 先写入 `<目标>.part`，传输完整后再重命名为目标文件；目标文件已存在时跳过传输。
/// 屏幕录制（VGA）下载完成且开启了幻灯片提取时，产生一个 [`ExtractTask`]。
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub title: String,
    pub media_type: MediaType,
    pub segment_seq: Option<u32>,
    pub remote_url: String,
    pub destination: PathBuf,
    pub options: DownloadOptions,
}

impl DownloadTask {
    pub fn new(
        title: impl Into<String>,
        media_type: MediaType,
        segment_seq: Option<u32>,
        remote_url: impl Into<String>,
        destination: PathBuf,
        options: DownloadOptions,
    ) -> Self {
        Self {
            title: title.into(),
            media_type,
            segment_seq,
            remote_url: remote_url.into(),
            destination,
            options,
        }
    }

    async fn transfer(&self, reporter: &TaskReporter) -> Result<(), TaskError> {
        let part = part_path(&self.destination);

        // 清理上次中断留下的临时文件
        if tokio::fs::try_exists(&part).await? {
            debug!("删除残留的临时文件: {:?}", part);
            tokio::fs::remove_file(&part).await?;
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .default_headers(SmartclassClient::default_headers())
            .build()
            .map_err(|e| TaskError::Transfer(format!("创建下载客户端失败: {}", e)))?;

        debug!("开始下载: {} -> {:?}", self.remote_url, self.destination);
        let response = client
            .get(&self.remote_url)
            .send()
            .await
            .map_err(|e| TaskError::Transfer(format!("请求失败: {}", e)))?;
        check_response_status(&response, &self.remote_url)?;

        // 大小未知时不上报进度
        let total_size = response.content_length().filter(|size| *size > 0);

        let mut file = tokio::fs::File::create(&part)
            .await
            .map_err(|e| TaskError::Transfer(format!("创建临时文件失败 {:?}: {}", part, e)))?;
        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result
                .map_err(|e| TaskError::Transfer(format!("读取数据流失败: {}", e)))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| TaskError::Transfer(format!("写入临时文件失败: {}", e)))?;
            downloaded += chunk.len() as u64;

            if let Some(total) = total_size {
                reporter.report_progress(None, Some(downloaded as f64 / total as f64));
            }
        }
        file.flush()
            .await
            .map_err(|e| TaskError::Transfer(format!("写入临时文件失败: {}", e)))?;
        drop(file);

        if let Some(total) = total_size {
            if downloaded < total {
                return Err(TaskError::Transfer(format!(
                    "数据不完整: 已接收 {} / {} 字节",
                    downloaded, total
                )));
            }
        }

        tokio::fs::rename(&part, &self.destination).await?;
        debug!("下载完成: {:?} ({} 字节)", self.destination, downloaded);
        Ok(())
    }
}

#[async_trait]
impl TaskTrait for DownloadTask {
    fn resource_class(&self) -> ResourceClass {
        ResourceClass::Download
    }

    fn display_name(&self) -> String {
        match self.segment_seq {
            Some(seq) => format!("{} - Seg{} - {}", self.title, seq, self.media_type),
            None => format!("{} - {}", self.title, self.media_type),
        }
    }

    async fn execute(&self, ctx: &TaskContext) -> Result<(), TaskError> {
        if let Some(parent) = self.destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        if tokio::fs::try_exists(&self.destination).await? {
            info!("⏭️ 文件已存在，跳过下载: {:?}", self.destination);
        } else {
            self.transfer(ctx.reporter()).await?;
        }

        if self.media_type.is_screen_recording() && self.options.extract_slides {
            ctx.emit(ExtractTask::new(
                self.title.clone(),
                self.destination.clone(),
                self.segment_seq,
                self.options.extractor.clone(),
            ));
        }
        Ok(())
    }
}

// 检查响应状态并处理特殊情况
fn check_response_status(response: &reqwest::Response, url: &str) -> Result<(), TaskError> {
    let status = response.status();
    debug!("Response Status: {}", status);

    match status {
        status if status.is_success() => Ok(()),
        reqwest::StatusCode::NOT_FOUND => Err(TaskError::NotFound(format!(
            "远程文件不存在 (404 Not Found)，URL: {}",
            url
        ))),
        reqwest::StatusCode::FORBIDDEN | reqwest::StatusCode::UNAUTHORIZED => {
            warn!("🔐 下载被拒绝 ({})，可能是登录状态已失效", status);
            Err(TaskError::Transfer(format!(
                "访问被拒绝 ({})，URL: {}，请检查登录状态",
                status, url
            )))
        }
        reqwest::StatusCode::TOO_MANY_REQUESTS => {
            warn!("⚠️ 请求过于频繁 (429 Too Many Requests)");
            Err(TaskError::Transfer(format!(
                "请求过于频繁 (429 Too Many Requests)，URL: {}，请稍后重试",
                url
            )))
        }
        _ => Err(TaskError::Transfer(format!(
            "HTTP 请求失败，状态码: {}，URL: {}",
            status, url
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(segment_seq: Option<u32>) -> DownloadTask {
        DownloadTask::new(
            "高等数学 - 20240301 0800_0935",
            MediaType::Video1,
            segment_seq,
            "http://example.invalid/Video1.mp4",
            PathBuf::from("out/Video1.mp4"),
            DownloadOptions::default(),
        )
    }

    #[test]
    fn display_name_includes_segment_when_present() {
        assert_eq!(
            task(Some(2)).display_name(),
            "高等数学 - 20240301 0800_0935 - Seg2 - Video1"
        );
        assert_eq!(
            task(None).display_name(),
            "高等数学 - 20240301 0800_0935 - Video1"
        );
        assert_eq!(task(None).resource_class(), ResourceClass::Download);
    }
}
