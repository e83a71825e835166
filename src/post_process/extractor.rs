use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tracing::{debug, info};

use crate::common::utils::part_path;
use crate::downloader::error::TaskError;
use crate::downloader::models::ResourceClass;
use crate::downloader::progress::TaskContext;
use crate::downloader::task::TaskTrait;

/// 提取结果文档的文件名，与源视频放在同一目录
pub const SLIDES_FILE_NAME: &str = "Slides.pdf";

const DEFAULT_EXTRACTOR: &str = "smartclass-slides";

/// 外部幻灯片提取程序
///
/// 调用方式：`program args... --input <视频> --output <输出.part>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ExtractorCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Default for ExtractorCommand {
    // 支持通过环境变量指定提取程序路径
    fn default() -> Self {
        let program =
            std::env::var("SLIDES_EXTRACTOR_PATH").unwrap_or_else(|_| DEFAULT_EXTRACTOR.to_string());
        Self::new(program, Vec::new())
    }
}

// 提取程序在标准输出上逐行打印的进度记录
#[derive(Debug, Deserialize)]
struct ProgressLine {
    step: String,
    current: i64,
    total: i64,
}

/// 解析一行进度输出，返回步骤名称和进度
///
/// `total > 0` 时进度为 `current / total`，否则为 `None`。
/// 无法解析的行返回 `None`，调用方直接忽略。
pub fn parse_progress_line(line: &str) -> Option<(String, Option<f64>)> {
    let record: ProgressLine = serde_json::from_str(line.trim()).ok()?;
    let progress = (record.total > 0).then(|| record.current as f64 / record.total as f64);
    Some((record.step, progress))
}

/// 从屏幕录制视频中提取幻灯片
#[derive(Debug, Clone)]
pub struct ExtractTask {
    pub title: String,
    pub source_video: PathBuf,
    pub segment_seq: Option<u32>,
    pub extractor: ExtractorCommand,
}

impl ExtractTask {
    pub fn new(
        title: impl Into<String>,
        source_video: PathBuf,
        segment_seq: Option<u32>,
        extractor: ExtractorCommand,
    ) -> Self {
        Self {
            title: title.into(),
            source_video,
            segment_seq,
            extractor,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.source_video
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(SLIDES_FILE_NAME)
    }
}

#[async_trait]
impl TaskTrait for ExtractTask {
    fn resource_class(&self) -> ResourceClass {
        ResourceClass::Extract
    }

    fn display_name(&self) -> String {
        match self.segment_seq {
            Some(seq) => format!("{} - Seg{} - Slides", self.title, seq),
            None => format!("{} - Slides", self.title),
        }
    }

    async fn execute(&self, ctx: &TaskContext) -> Result<(), TaskError> {
        let output = self.output_path();
        if tokio::fs::try_exists(&output).await? {
            info!("⏭️ 幻灯片已存在，跳过提取: {:?}", output);
            return Ok(());
        }

        let part = part_path(&output);
        if tokio::fs::try_exists(&part).await? {
            debug!("删除残留的临时文件: {:?}", part);
            tokio::fs::remove_file(&part).await?;
        }

        let program = &self.extractor.program;
        debug!("启动幻灯片提取程序: {:?} {:?}", program, self.extractor.args);

        // kill_on_drop: 执行过程被中断时不留下子进程
        let mut child = Command::new(program)
            .args(&self.extractor.args)
            .arg("--input")
            .arg(&self.source_video)
            .arg("--output")
            .arg(&part)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TaskError::Subprocess(format!("无法启动幻灯片提取程序 {:?}: {}", program, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TaskError::Subprocess("无法读取提取程序的标准输出".to_string()))?;
        let stderr_tail = child.stderr.take().map(|stderr| tokio::spawn(last_line(stderr)));

        let mut lines = BufReader::new(stdout).split(b'\n');
        while let Some(segment) = lines
            .next_segment()
            .await
            .map_err(|e| TaskError::Subprocess(format!("读取提取程序输出失败: {}", e)))?
        {
            let line = String::from_utf8_lossy(&segment);
            match parse_progress_line(&line) {
                Some((step, progress)) => ctx.report_progress(Some(&step), progress),
                None => debug!("忽略提取程序输出: {}", line.trim_end()),
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| TaskError::Subprocess(format!("等待提取程序退出失败: {}", e)))?;
        let stderr_tail = match stderr_tail {
            Some(handle) => handle.await.ok().flatten(),
            None => None,
        };

        if !status.success() {
            let code = status
                .code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| "无（被信号终止）".to_string());
            let mut message = format!("幻灯片提取程序退出码 {}", code);
            if let Some(tail) = stderr_tail {
                message.push_str(&format!(": {}", tail));
            }
            return Err(TaskError::Subprocess(message));
        }

        tokio::fs::rename(&part, &output).await?;
        info!("✅ 幻灯片已保存: {:?}", output);
        Ok(())
    }
}

// 读完标准错误，保留最后一行非空内容用于错误信息
async fn last_line(stderr: ChildStderr) -> Option<String> {
    let mut lines = BufReader::new(stderr).split(b'\n');
    let mut last = None;
    while let Ok(Some(segment)) = lines.next_segment().await {
        let text = String::from_utf8_lossy(&segment).trim().to_string();
        if !text.is_empty() {
            last = Some(text);
        }
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_maps_to_fraction() {
        let parsed = parse_progress_line(r#"{"step":"Analyzing","current":50,"total":200}"#);
        assert_eq!(parsed, Some(("Analyzing".to_string(), Some(0.25))));
    }

    #[test]
    fn zero_total_has_no_progress() {
        let parsed = parse_progress_line(r#"{"step":"Saving","current":0,"total":0}"#);
        assert_eq!(parsed, Some(("Saving".to_string(), None)));
    }

    #[test]
    fn malformed_lines_are_ignored() {
        assert_eq!(parse_progress_line("Traceback (most recent call last):"), None);
        assert_eq!(parse_progress_line(r#"{"step":"Analyzing"}"#), None);
        assert_eq!(parse_progress_line(""), None);
        // 额外字段和行尾的 \r 不影响解析
        let parsed =
            parse_progress_line("{\"step\":\"Filtering\",\"current\":1,\"total\":4,\"fps\":25}\r");
        assert_eq!(parsed, Some(("Filtering".to_string(), Some(0.25))));
    }

    #[test]
    fn output_sits_next_to_source_video() {
        let task = ExtractTask::new(
            "线性代数",
            PathBuf::from("root/Seg2/VGA.mp4"),
            Some(2),
            ExtractorCommand::new("/bin/true", Vec::new()),
        );
        assert_eq!(task.output_path(), PathBuf::from("root/Seg2/Slides.pdf"));
        assert_eq!(task.display_name(), "线性代数 - Seg2 - Slides");
        assert_eq!(task.resource_class(), ResourceClass::Extract);

        let single = ExtractTask::new("线性代数", PathBuf::from("VGA.mp4"), None, task.extractor);
        assert_eq!(single.output_path(), PathBuf::from("Slides.pdf"));
        assert_eq!(single.display_name(), "线性代数 - Slides");
    }
}
